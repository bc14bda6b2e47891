//! Integration tests for the full scoring pipeline.
//!
//! Exercises: catalog → ArchetypeRegistry → qualifier → distance/balance
//! scores → dynamic balance → matcher → compressor, using the embedded
//! archetype catalog and calibration samples.

use vintage_logic::characteristics::{Characteristic, Characteristics};
use vintage_logic::compress::{compress, QualityTier};
use vintage_logic::engine::Engine;
use vintage_logic::qualifier::{qualification_failure, qualifies, QualificationFailure};
use vintage_logic::sample::{Grape, GrapeColor, Metadata, Sample, SampleRecord};
use vintage_logic::scoring::archetype_balance;
use vintage_logic::ValidationError;

use Characteristic::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn engine() -> Engine {
    Engine::builtin().expect("builtin catalog must load")
}

fn values(sweetness: f64, acidity: f64, tannins: f64, aroma: f64, body: f64, spice: f64) -> Characteristics {
    Characteristics {
        sweetness,
        acidity,
        tannins,
        aroma,
        body,
        spice,
    }
}

fn grape(name: &str, color: GrapeColor) -> Metadata {
    Metadata {
        grape: Some(Grape {
            name: name.into(),
            color,
        }),
        ..Metadata::default()
    }
}

fn white(v: Characteristics) -> Sample {
    Sample::new(v).with_metadata(grape("Chenin Blanc", GrapeColor::White))
}

fn red(v: Characteristics) -> Sample {
    let mut meta = grape("Syrah", GrapeColor::Red);
    meta.ripeness = Some(0.8);
    Sample::new(v).with_metadata(meta)
}

fn near_ideal_sweet() -> Characteristics {
    values(0.95, 0.9, 0.5, 0.5, 0.5, 0.7)
}

// ── Calibration scenarios ──────────────────────────────────────────────

#[test]
fn sweet_white_near_ideal_balance() {
    let engine = engine();
    let archetype = engine.registry().get("Sweet White Wine").unwrap();
    let ab = archetype_balance(&near_ideal_sweet(), archetype);
    assert!((0.95..=1.0).contains(&ab), "archetype balance {}", ab);

    let result = engine.evaluate_sample(&white(near_ideal_sweet()));
    assert!(result.qualifies);
    assert_eq!(result.matched_archetype.as_deref(), Some("Sweet White Wine"));
    assert_eq!(result.archetype_balance, Some(ab));
    assert!(result.score > 0.95, "score {}", result.score);
}

#[test]
fn low_acidity_falls_back_to_dynamic_balance() {
    let engine = engine();
    let best = engine.evaluate_sample(&white(near_ideal_sweet()));

    let sample = white(values(0.9, 0.4, 0.5, 0.5, 0.5, 0.5));
    let archetype = engine.registry().get("Sweet White Wine").unwrap();
    assert!(matches!(
        qualification_failure(&sample, archetype),
        Some(QualificationFailure::OutOfRange {
            characteristic: Acidity,
            ..
        })
    ));

    let result = engine.evaluate_sample(&sample);
    assert!(!result.qualifies);
    assert_eq!(result.matched_archetype, None);
    assert_eq!(result.raw_score, result.dynamic_balance);
    assert_eq!(result.score, compress(result.dynamic_balance));
    assert!(
        result.dynamic_balance < best.score - 0.1,
        "dynamic {} should be well below {}",
        result.dynamic_balance,
        best.score
    );
}

#[test]
fn all_zero_sample_scores_low() {
    let engine = engine();
    let sample = red(Characteristics::uniform(0.0));
    let bold = engine.registry().get("Bold Red").unwrap();
    assert!(!qualifies(&sample, bold));

    let result = engine.evaluate_sample(&sample);
    assert!(!result.qualifies);
    assert!(result.score < 0.4, "score {}", result.score);
}

#[test]
fn all_one_sample_scores_low() {
    let engine = engine();
    let sample = red(Characteristics::uniform(1.0));
    let bold = engine.registry().get("Bold Red").unwrap();
    assert!(!qualifies(&sample, bold));

    let result = engine.evaluate_sample(&sample);
    assert!(result.score < 0.4, "score {}", result.score);
}

#[test]
fn acidity_down_interaction_targets_spice_not_tannins() {
    let engine = engine();
    let base = values(0.5, 0.45, 0.5, 0.5, 0.6, 0.5);
    let low_spice = Sample::new(base.with(Spice, 0.25));
    let low_tannins = Sample::new(base.with(Tannins, 0.25));

    let a = engine.evaluate_sample(&low_spice);
    let b = engine.evaluate_sample(&low_tannins);
    assert!(
        a.score < b.score,
        "low spice {} should score below low tannins {}",
        a.score,
        b.score
    );
}

#[test]
fn compressor_anchor_points() {
    assert!((compress(0.4) - 0.24).abs() < 1e-9);
    assert!((compress(0.7) - 0.56).abs() < 1e-9);
    assert!((compress(1.0) - 1.0).abs() < 1e-9);
}

// ── Matcher behavior ───────────────────────────────────────────────────

#[test]
fn bold_red_matches_structured_red() {
    let engine = engine();
    let result = engine.evaluate_sample(&red(values(0.2, 0.55, 0.85, 0.6, 0.85, 0.75)));
    assert!(result.qualifies);
    assert_eq!(result.matched_archetype.as_deref(), Some("Bold Red"));
    assert!(result.score > 0.9, "score {}", result.score);
    assert!(result.tier >= QualityTier::Superior);
}

#[test]
fn centered_sample_beats_single_extremes() {
    let engine = engine();
    let center = engine.evaluate_sample(&Sample::new(Characteristics::uniform(0.5)));
    for c in Characteristic::ALL {
        for extreme in [0.0, 1.0] {
            let s = Sample::new(Characteristics::uniform(0.5).with(c, extreme));
            let result = engine.evaluate_sample(&s);
            assert!(
                result.dynamic_balance < center.dynamic_balance,
                "{} = {}",
                c,
                extreme
            );
        }
    }
}

#[test]
fn nearest_archetype_suggests_style_for_non_qualifier() {
    let engine = engine();

    let nearest = engine.nearest_archetype(&white(near_ideal_sweet())).unwrap();
    assert_eq!(nearest.name, "Sweet White Wine");
    assert!(nearest.qualifies);

    // Fails the strict gate (no grape recorded), still gets a suggestion.
    let unlabeled = Sample::new(values(0.1, 0.55, 0.8, 0.6, 0.8, 0.7));
    assert!(!engine.evaluate_sample(&unlabeled).qualifies);
    let nearest = engine.nearest_archetype(&unlabeled).unwrap();
    assert_eq!(nearest.name, "Bold Red");
    assert!(nearest.qualifies);
}

#[test]
fn evaluate_json_record() {
    let engine = engine();
    let json = r#"{
        "characteristics": {
            "sweetness": 0.95, "acidity": 0.9, "tannins": 0.5,
            "aroma": 0.5, "body": 0.5, "spice": 0.7
        },
        "metadata": { "grape": { "name": "Chenin Blanc", "color": "white" } }
    }"#;
    let record: SampleRecord = serde_json::from_str(json).unwrap();
    let result = engine.evaluate(&record).unwrap();
    assert_eq!(result, engine.evaluate_sample(&white(near_ideal_sweet())));
}

#[test]
fn incomplete_record_is_a_validation_error() {
    let engine = engine();
    let json = r#"{ "characteristics": { "sweetness": 0.5, "acidity": 0.5 } }"#;
    let record: SampleRecord = serde_json::from_str(json).unwrap();
    assert_eq!(
        engine.evaluate(&record),
        Err(ValidationError::MissingCharacteristic(Tannins))
    );
}

#[test]
fn evaluation_is_deterministic() {
    let engine = engine();
    let sample = red(values(0.3, 0.6, 0.7, 0.4, 0.75, 0.65));
    assert_eq!(engine.evaluate_sample(&sample), engine.evaluate_sample(&sample));
}

#[test]
fn batch_matches_single_evaluation() {
    let engine = engine();
    let samples = [
        white(near_ideal_sweet()),
        red(Characteristics::uniform(0.0)),
        Sample::new(Characteristics::uniform(0.5)),
    ];
    let records: Vec<SampleRecord> = samples.iter().map(SampleRecord::from).collect();
    let batch = engine.evaluate_many(&records);
    for (sample, result) in samples.iter().zip(batch) {
        assert_eq!(result.unwrap(), engine.evaluate_sample(sample));
    }
}
