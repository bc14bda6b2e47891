//! Requirement qualifier — the hard gate between a sample and an archetype.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. hard requirements (grape, quality, vintage, prestige, oxidation, ripeness)
//! 2. processing requirements (ecological farming, processing method)
//! 3. regional requirements (country, region, soil, terrain)
//! 4. every ideal range must contain the sample's value
//!
//! Missing metadata fails the check it is needed for. Unrecognized requirement
//! kinds, and unrecognized keys anywhere in the archetype or its regional and
//! processing blocks, always fail.

use std::fmt;

use crate::archetypes::{
    Archetype, ProcessingRequirements, RegionalRequirements, Requirement, UnrecognizedKeys,
};
use crate::characteristics::{Characteristic, Interval};
use crate::sample::{Metadata, Sample};

/// Why a sample does not qualify for an archetype.
#[derive(Debug, Clone, PartialEq)]
pub enum QualificationFailure {
    Requirement(Requirement),
    /// A requirement key the engine does not understand, e.g. `regional.appellation`.
    UnrecognizedKey(String),
    NotEcological,
    ProcessingMethod,
    Country,
    Region,
    Soil,
    Terrain,
    OutOfRange {
        characteristic: Characteristic,
        value: f64,
        range: Interval,
    },
}

impl fmt::Display for QualificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualificationFailure::Requirement(r) => write!(f, "requirement not met: {:?}", r),
            QualificationFailure::UnrecognizedKey(key) => {
                write!(f, "unrecognized requirement '{}'", key)
            }
            QualificationFailure::NotEcological => write!(f, "origin is not ecological"),
            QualificationFailure::ProcessingMethod => write!(f, "processing method not allowed"),
            QualificationFailure::Country => write!(f, "wrong country"),
            QualificationFailure::Region => write!(f, "region not allowed"),
            QualificationFailure::Soil => write!(f, "soil not allowed"),
            QualificationFailure::Terrain => write!(f, "terrain not allowed"),
            QualificationFailure::OutOfRange {
                characteristic,
                value,
                range,
            } => write!(
                f,
                "{} = {:.3} outside [{:.3}, {:.3}]",
                characteristic, value, range.min, range.max
            ),
        }
    }
}

/// Does `sample` satisfy every requirement and ideal range of `archetype`?
pub fn qualifies(sample: &Sample, archetype: &Archetype) -> bool {
    qualification_failure(sample, archetype).is_none()
}

/// The first failing check, or `None` when the sample qualifies.
pub fn qualification_failure(
    sample: &Sample,
    archetype: &Archetype,
) -> Option<QualificationFailure> {
    let meta = &sample.metadata;

    if let Some(failure) = check_unrecognized(&archetype.name, "", &archetype.unrecognized) {
        return Some(failure);
    }

    for requirement in &archetype.requirements {
        if !requirement_met(requirement, meta) {
            if *requirement == Requirement::Unrecognized {
                log::warn!(
                    "archetype '{}' has an unrecognized requirement; treating as unmet",
                    archetype.name
                );
            }
            return Some(QualificationFailure::Requirement(requirement.clone()));
        }
    }

    if let Some(processing) = &archetype.processing {
        if let Some(failure) =
            check_unrecognized(&archetype.name, "processing.", &processing.unrecognized)
                .or_else(|| check_processing(processing, meta))
        {
            return Some(failure);
        }
    }

    if let Some(regional) = &archetype.regional {
        if let Some(failure) =
            check_unrecognized(&archetype.name, "regional.", &regional.unrecognized)
                .or_else(|| check_regional(regional, meta))
        {
            return Some(failure);
        }
    }

    for (&c, &range) in &archetype.ideal_ranges {
        let value = sample.get(c);
        if !range.contains(value) {
            return Some(QualificationFailure::OutOfRange {
                characteristic: c,
                value,
                range,
            });
        }
    }

    None
}

/// One handler per requirement kind. Absent metadata never satisfies a requirement.
fn requirement_met(requirement: &Requirement, meta: &Metadata) -> bool {
    match requirement {
        Requirement::GrapeColor { color } => {
            meta.grape.as_ref().is_some_and(|g| g.color == *color)
        }
        Requirement::Grape { names } => meta
            .grape
            .as_ref()
            .is_some_and(|g| names.iter().any(|n| *n == g.name)),
        Requirement::MinQuality { value } => meta.quality.is_some_and(|q| q >= *value),
        Requirement::MinVintage { year } => meta.vintage.is_some_and(|v| v >= *year),
        Requirement::MinPrestige { value } => meta.prestige.is_some_and(|p| p >= *value),
        Requirement::Oxidation { range } => meta.oxidation.is_some_and(|o| range.contains(o)),
        Requirement::Ripeness { range } => meta.ripeness.is_some_and(|r| range.contains(r)),
        Requirement::Unrecognized => false,
    }
}

/// Unknown keys fail closed; the first one (in key order) is reported.
fn check_unrecognized(
    archetype: &str,
    prefix: &str,
    keys: &UnrecognizedKeys,
) -> Option<QualificationFailure> {
    let key = keys.keys().next()?;
    log::warn!(
        "archetype '{}' has an unrecognized requirement '{}{}'; treating as unmet",
        archetype,
        prefix,
        key
    );
    Some(QualificationFailure::UnrecognizedKey(format!("{}{}", prefix, key)))
}

fn check_processing(
    processing: &ProcessingRequirements,
    meta: &Metadata,
) -> Option<QualificationFailure> {
    if processing.require_ecological && !meta.origin.as_ref().is_some_and(|o| o.ecological) {
        return Some(QualificationFailure::NotEcological);
    }
    if let Some(methods) = &processing.methods {
        let allowed = meta
            .processing
            .as_ref()
            .is_some_and(|m| methods.contains(m));
        if !allowed {
            return Some(QualificationFailure::ProcessingMethod);
        }
    }
    None
}

fn check_regional(
    regional: &RegionalRequirements,
    meta: &Metadata,
) -> Option<QualificationFailure> {
    let origin = meta.origin.as_ref();

    if let Some(country) = &regional.country {
        if !origin.is_some_and(|o| o.country == *country) {
            return Some(QualificationFailure::Country);
        }
    }
    if let Some(regions) = &regional.regions {
        let ok = origin
            .and_then(|o| o.region.as_ref())
            .is_some_and(|r| regions.contains(r));
        if !ok {
            return Some(QualificationFailure::Region);
        }
    }
    if let Some(soils) = &regional.soils {
        // Any one matching soil is enough.
        let ok = origin.is_some_and(|o| o.soils.iter().any(|s| soils.contains(s)));
        if !ok {
            return Some(QualificationFailure::Soil);
        }
    }
    if let Some(terrains) = &regional.terrains {
        let ok = origin
            .and_then(|o| o.terrain.as_ref())
            .is_some_and(|t| terrains.contains(t));
        if !ok {
            return Some(QualificationFailure::Terrain);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristics::Characteristics;
    use crate::sample::{Grape, GrapeColor, Origin};
    use Characteristic::*;

    fn white_grape(name: &str) -> Grape {
        Grape {
            name: name.into(),
            color: GrapeColor::White,
        }
    }

    fn sweet_white() -> Archetype {
        Archetype::new("Sweet White Wine")
            .require(Requirement::GrapeColor {
                color: GrapeColor::White,
            })
            .ideal(Sweetness, 0.8, 1.0)
            .ideal(Acidity, 0.8, 1.0)
    }

    fn sweet_sample() -> Sample {
        Sample::new(
            Characteristics::uniform(0.5)
                .with(Sweetness, 0.9)
                .with(Acidity, 0.85),
        )
        .with_metadata(Metadata {
            grape: Some(white_grape("Riesling")),
            ..Metadata::default()
        })
    }

    #[test]
    fn test_matching_sample_qualifies() {
        assert!(qualifies(&sweet_sample(), &sweet_white()));
    }

    #[test]
    fn test_missing_grape_fails_without_error() {
        let sample = Sample::new(sweet_sample().characteristics);
        assert!(matches!(
            qualification_failure(&sample, &sweet_white()),
            Some(QualificationFailure::Requirement(Requirement::GrapeColor { .. }))
        ));
    }

    #[test]
    fn test_wrong_color_fails() {
        let mut sample = sweet_sample();
        sample.metadata.grape = Some(Grape {
            name: "Merlot".into(),
            color: GrapeColor::Red,
        });
        assert!(!qualifies(&sample, &sweet_white()));
    }

    #[test]
    fn test_out_of_range_characteristic_fails() {
        let mut sample = sweet_sample();
        sample.characteristics.acidity = 0.4;
        assert_eq!(
            qualification_failure(&sample, &sweet_white()),
            Some(QualificationFailure::OutOfRange {
                characteristic: Acidity,
                value: 0.4,
                range: Interval::new(0.8, 1.0),
            })
        );
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut sample = sweet_sample();
        sample.characteristics.sweetness = 0.8;
        sample.characteristics.acidity = 1.0;
        assert!(qualifies(&sample, &sweet_white()));
    }

    #[test]
    fn test_unrecognized_requirement_fails_closed() {
        let a = sweet_white().require(Requirement::Unrecognized);
        assert!(!qualifies(&sweet_sample(), &a));
    }

    #[test]
    fn test_minimums_and_intervals() {
        let a = sweet_white()
            .require(Requirement::MinQuality { value: 0.7 })
            .require(Requirement::MinVintage { year: 2015 })
            .require(Requirement::Ripeness {
                range: Interval::new(0.8, 1.0),
            });
        let mut sample = sweet_sample();
        assert!(!qualifies(&sample, &a), "no quality recorded");

        sample.metadata.quality = Some(0.7);
        sample.metadata.vintage = Some(2018);
        sample.metadata.ripeness = Some(0.9);
        assert!(qualifies(&sample, &a));

        sample.metadata.vintage = Some(2014);
        assert!(!qualifies(&sample, &a));
    }

    #[test]
    fn test_oxidation_interval() {
        let a = sweet_white().require(Requirement::Oxidation {
            range: Interval::new(0.6, 1.0),
        });
        let mut sample = sweet_sample();
        assert!(
            matches!(
                qualification_failure(&sample, &a),
                Some(QualificationFailure::Requirement(Requirement::Oxidation { .. }))
            ),
            "no oxidation recorded"
        );

        sample.metadata.oxidation = Some(0.6);
        assert!(qualifies(&sample, &a));

        sample.metadata.oxidation = Some(0.59);
        assert!(!qualifies(&sample, &a));
    }

    #[test]
    fn test_grape_membership() {
        let a = sweet_white().require(Requirement::Grape {
            names: vec!["Riesling".into(), "Chenin Blanc".into()],
        });
        assert!(qualifies(&sweet_sample(), &a));

        let mut sample = sweet_sample();
        sample.metadata.grape = Some(white_grape("Chardonnay"));
        assert!(!qualifies(&sample, &a));
    }

    #[test]
    fn test_processing_requirements() {
        let a = sweet_white().processing(ProcessingRequirements {
            require_ecological: true,
            methods: Some(vec!["traditional".into()]),
            ..ProcessingRequirements::default()
        });
        let mut sample = sweet_sample();
        assert_eq!(
            qualification_failure(&sample, &a),
            Some(QualificationFailure::NotEcological)
        );

        sample.metadata.origin = Some(Origin {
            country: "Germany".into(),
            ecological: true,
            ..Origin::default()
        });
        assert_eq!(
            qualification_failure(&sample, &a),
            Some(QualificationFailure::ProcessingMethod)
        );

        sample.metadata.processing = Some("traditional".into());
        assert!(qualifies(&sample, &a));
    }

    #[test]
    fn test_regional_requirements() {
        let a = sweet_white().regional(RegionalRequirements {
            country: Some("Germany".into()),
            regions: Some(vec!["Mosel".into()]),
            soils: Some(vec!["slate".into()]),
            terrains: Some(vec!["steep slope".into()]),
            ..RegionalRequirements::default()
        });
        let mut sample = sweet_sample();
        assert_eq!(
            qualification_failure(&sample, &a),
            Some(QualificationFailure::Country)
        );

        sample.metadata.origin = Some(Origin {
            country: "Germany".into(),
            region: Some("Mosel".into()),
            soils: vec!["clay".into(), "slate".into()],
            terrain: Some("steep slope".into()),
            ecological: false,
        });
        assert!(qualifies(&sample, &a));

        if let Some(origin) = sample.metadata.origin.as_mut() {
            origin.soils = vec!["clay".into()];
        }
        assert_eq!(
            qualification_failure(&sample, &a),
            Some(QualificationFailure::Soil)
        );
    }

    fn strict_catalog_entry(extra: &str) -> Archetype {
        let json = format!(
            r#"{{
                "version": 1,
                "archetypes": [{{
                    "name": "Strict",
                    "requirements": [{{ "kind": "grape_color", "color": "white" }}],
                    "ideal_ranges": {{ "sweetness": [0.8, 1.0], "acidity": [0.8, 1.0] }},
                    {}
                }}]
            }}"#,
            extra
        );
        let registry = crate::archetypes::ArchetypeRegistry::from_json(&json).unwrap();
        registry.get("Strict").unwrap().clone()
    }

    #[test]
    fn test_unknown_regional_key_fails_closed() {
        let a = strict_catalog_entry(r#""regional": { "appellation": ["Grand Cru"] }"#);
        assert_eq!(
            qualification_failure(&sweet_sample(), &a),
            Some(QualificationFailure::UnrecognizedKey(
                "regional.appellation".into()
            ))
        );
        let bare = Sample::new(Characteristics::uniform(0.5));
        assert!(!qualifies(&bare, &a));
    }

    #[test]
    fn test_unknown_processing_key_fails_closed() {
        let a = strict_catalog_entry(r#""processing": { "barrel": "oak" }"#);
        assert_eq!(
            qualification_failure(&sweet_sample(), &a),
            Some(QualificationFailure::UnrecognizedKey("processing.barrel".into()))
        );
    }

    #[test]
    fn test_unknown_top_level_key_fails_closed() {
        let a = strict_catalog_entry(r#""min_age": 5"#);
        assert_eq!(
            qualification_failure(&sweet_sample(), &a),
            Some(QualificationFailure::UnrecognizedKey("min_age".into()))
        );
    }

    #[test]
    fn test_known_keys_only_still_qualify() {
        let a = strict_catalog_entry(r#""regional": {}, "processing": {}"#);
        assert!(qualifies(&sweet_sample(), &a));
    }

    #[test]
    fn test_empty_regional_block_is_unconstrained() {
        let a = sweet_white().regional(RegionalRequirements::default());
        assert!(qualifies(&sweet_sample(), &a));
    }

    #[test]
    fn test_hard_requirements_checked_before_ranges() {
        let a = sweet_white().require(Requirement::MinPrestige { value: 0.5 });
        let mut sample = sweet_sample();
        sample.characteristics.acidity = 0.1;
        assert!(matches!(
            qualification_failure(&sample, &a),
            Some(QualificationFailure::Requirement(Requirement::MinPrestige { .. }))
        ));
    }
}
