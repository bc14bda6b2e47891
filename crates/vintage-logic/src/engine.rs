//! Archetype matcher — the engine's public entry point.
//!
//! An [`Engine`] is built once from an [`EngineConfig`] (catalog, baseline,
//! rules), validated, and is immutable afterwards. Every evaluation is an
//! independent pure function of the engine and the sample, so one engine can
//! be shared across threads without locking.
//!
//! ```
//! use vintage_logic::characteristics::Characteristics;
//! use vintage_logic::engine::Engine;
//! use vintage_logic::sample::Sample;
//!
//! let engine = Engine::builtin().unwrap();
//! let result = engine.evaluate_sample(&Sample::new(Characteristics::uniform(0.5)));
//! assert!((0.0..=1.0).contains(&result.score));
//! assert!(!result.qualifies); // no grape recorded, so no archetype qualifies
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::archetypes::{self, Archetype, ArchetypeDef, ArchetypeRegistry};
use crate::compress::{compress, QualityTier};
use crate::dynamic;
use crate::error::{ConfigError, ValidationError};
use crate::qualifier::qualifies;
use crate::rules::{BaselineTable, DynamicRules};
use crate::sample::{Sample, SampleRecord};
use crate::scoring::archetype_balance;

/// Everything an engine is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub archetypes: Vec<ArchetypeDef>,
    #[serde(default)]
    pub baseline: BaselineTable,
    #[serde(default)]
    pub rules: DynamicRules,
}

impl EngineConfig {
    /// Embedded catalog with the default baseline and rules.
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self {
            archetypes: archetypes::builtin_defs()?,
            baseline: BaselineTable::default(),
            rules: DynamicRules::default(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Result of scoring one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Final, compressed score in \[0, 1\].
    pub score: f64,
    /// Score before compression.
    pub raw_score: f64,
    pub dynamic_balance: f64,
    pub synergy_bonus: f64,
    /// Best qualifying archetype, if any.
    pub matched_archetype: Option<String>,
    pub archetype_balance: Option<f64>,
    pub qualifies: bool,
    pub tier: QualityTier,
}

/// Closest archetype by out-of-range distance, ignoring weights and metadata
/// other than the grape restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestArchetype {
    pub name: String,
    /// Summed distance of characteristics outside their ideal ranges.
    pub distance: f64,
    /// Every characteristic is inside its ideal range.
    pub qualifies: bool,
}

#[derive(Debug, Clone)]
pub struct Engine {
    registry: ArchetypeRegistry,
    baseline: BaselineTable,
    rules: DynamicRules,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let registry = ArchetypeRegistry::from_defs(config.archetypes)?;
        Self::from_parts(registry, config.baseline, config.rules)
    }

    pub fn from_parts(
        registry: ArchetypeRegistry,
        baseline: BaselineTable,
        rules: DynamicRules,
    ) -> Result<Self, ConfigError> {
        baseline.validate()?;
        rules.validate()?;
        log::info!(
            "scoring engine ready: {} archetypes, {} adjustment rules, {} synergies",
            registry.len(),
            rules.adjustment_count(),
            rules.synergies().len()
        );
        Ok(Self {
            registry,
            baseline,
            rules,
        })
    }

    /// Engine over the embedded catalog with default baseline and rules.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(EngineConfig::builtin()?)
    }

    /// Engine over an explicit set of archetypes with default baseline and rules.
    pub fn with_archetypes(archetypes: Vec<Archetype>) -> Result<Self, ConfigError> {
        Self::from_parts(
            ArchetypeRegistry::new(archetypes)?,
            BaselineTable::default(),
            DynamicRules::default(),
        )
    }

    pub fn registry(&self) -> &ArchetypeRegistry {
        &self.registry
    }

    pub fn baseline(&self) -> &BaselineTable {
        &self.baseline
    }

    pub fn rules(&self) -> &DynamicRules {
        &self.rules
    }

    /// Validate a record and score it.
    pub fn evaluate(&self, record: &SampleRecord) -> Result<Evaluation, ValidationError> {
        let sample = Sample::try_from(record)?;
        Ok(self.evaluate_sample(&sample))
    }

    /// Score an already-validated sample.
    pub fn evaluate_sample(&self, sample: &Sample) -> Evaluation {
        let values = &sample.characteristics;
        let synergy_bonus = dynamic::synergy_bonus(values, &self.rules);
        let dynamic_balance =
            dynamic::dynamic_balance(values, &self.baseline, &self.rules, synergy_bonus);

        let mut best: Option<(&Archetype, f64)> = None;
        for archetype in self.registry.iter() {
            if !qualifies(sample, archetype) {
                continue;
            }
            let balance = archetype_balance(values, archetype);
            log::debug!("'{}' qualifies with balance {:.4}", archetype.name, balance);
            if best.map_or(true, |(_, b)| balance > b) {
                best = Some((archetype, balance));
            }
        }

        let raw_score = match best {
            Some((_, balance)) => balance.max(dynamic_balance),
            None => dynamic_balance,
        };
        let score = compress(raw_score);

        log::debug!(
            "evaluated sample: raw {:.4} → {:.4} (dynamic {:.4}, synergy {:.3}, match {:?})",
            raw_score,
            score,
            dynamic_balance,
            synergy_bonus,
            best.map(|(a, _)| a.name.as_str())
        );

        Evaluation {
            score,
            raw_score,
            dynamic_balance,
            synergy_bonus,
            matched_archetype: best.map(|(a, _)| a.name.clone()),
            archetype_balance: best.map(|(_, b)| b),
            qualifies: best.is_some(),
            tier: QualityTier::from_score(score),
        }
    }

    /// Score many records in parallel. Output order matches input order.
    pub fn evaluate_many(&self, records: &[SampleRecord]) -> Vec<Result<Evaluation, ValidationError>> {
        records.par_iter().map(|r| self.evaluate(r)).collect()
    }

    /// The archetype whose ideal ranges the sample is closest to, even if it
    /// fails the strict qualifier. Only the grape restriction is honoured.
    pub fn nearest_archetype(&self, sample: &Sample) -> Option<NearestArchetype> {
        let grape = sample.metadata.grape.as_ref().map(|g| g.name.as_str());

        let mut best: Option<(&Archetype, f64)> = None;
        for archetype in self.registry.iter() {
            if let Some(names) = archetype.required_grapes() {
                if !grape.is_some_and(|g| names.iter().any(|n| n == g)) {
                    continue;
                }
            }
            let distance: f64 = archetype
                .ideal_ranges
                .iter()
                .map(|(&c, range)| range.distance_outside(sample.get(c)))
                .sum();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((archetype, distance));
            }
        }

        best.map(|(archetype, distance)| NearestArchetype {
            name: archetype.name.clone(),
            distance,
            qualifies: distance == 0.0,
        })
    }
}
