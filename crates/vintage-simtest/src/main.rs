//! Vintage Headless Calibration Harness
//!
//! Validates the scoring engine and the embedded archetype catalog.
//! Everything runs in-process against the embedded catalog.
//!
//! Usage:
//!   cargo run -p vintage-simtest
//!   cargo run -p vintage-simtest -- --verbose

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vintage_logic::archetypes::{ArchetypeRegistry, Catalog, BUILTIN_CATALOG};
use vintage_logic::characteristics::{Characteristic, Characteristics};
use vintage_logic::compress::{compress, QualityTier};
use vintage_logic::dynamic;
use vintage_logic::engine::Engine;
use vintage_logic::rules::SYNERGY_CAP;
use vintage_logic::sample::{Grape, GrapeColor, Metadata, Sample};
use vintage_logic::scoring::{archetype_balance, balance_score, distance_score};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: String) -> Self {
        TestResult {
            name: name.into(),
            passed,
            detail,
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Vintage Calibration Harness ===\n");

    let engine = match Engine::builtin() {
        Ok(e) => e,
        Err(e) => {
            println!("  ✗ engine construction failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Catalog validation
    results.extend(validate_catalog(verbose));

    // 2. Compressor shape
    results.extend(validate_compressor(verbose));

    // 3. Calibration scenarios
    results.extend(validate_scenarios(&engine, verbose));

    // 4. Nearest-archetype self-consistency
    results.extend(validate_nearest(&engine, verbose));

    // 5. Seeded random sweep
    results.extend(validate_random_sweep(&engine, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn values(s: f64, a: f64, t: f64, ar: f64, b: f64, sp: f64) -> Characteristics {
    Characteristics {
        sweetness: s,
        acidity: a,
        tannins: t,
        aroma: ar,
        body: b,
        spice: sp,
    }
}

fn with_grape(v: Characteristics, name: &str, color: GrapeColor) -> Sample {
    Sample::new(v).with_metadata(Metadata {
        grape: Some(Grape {
            name: name.into(),
            color,
        }),
        ripeness: Some(0.8),
        ..Metadata::default()
    })
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Archetype Catalog ---");
    let mut results = Vec::new();

    let catalog: Catalog = match serde_json::from_str(BUILTIN_CATALOG) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check(
                "catalog_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return results;
        }
    };

    results.push(TestResult::check(
        "catalog_not_empty",
        !catalog.archetypes.is_empty(),
        format!("{} archetypes (v{})", catalog.archetypes.len(), catalog.version),
    ));

    let registry = match ArchetypeRegistry::from_defs(catalog.archetypes) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult::check("catalog_valid", false, e.to_string()));
            return results;
        }
    };
    results.push(TestResult::check(
        "catalog_valid",
        true,
        format!("{} archetypes validated", registry.len()),
    ));

    for archetype in registry.iter() {
        let ranges_in_unit = archetype
            .ideal_ranges
            .values()
            .all(|r| r.min >= 0.0 && r.max <= 1.0);
        results.push(TestResult::check(
            &format!("ranges_in_unit_{}", archetype.name),
            ranges_in_unit,
            format!("{} ideal ranges", archetype.ideal_ranges.len()),
        ));

        // Midpoint sample must score a perfect distance.
        let mut mid = Characteristics::uniform(0.5);
        for (&c, r) in &archetype.ideal_ranges {
            mid.set(c, r.midpoint());
        }
        let d = distance_score(&mid, archetype);
        results.push(TestResult::check(
            &format!("midpoint_distance_{}", archetype.name),
            (d - 1.0).abs() < 1e-9,
            format!("distance {:.6}, balance {:.4}", d, balance_score(&mid, archetype)),
        ));

        if verbose {
            println!(
                "  {:<24} {} requirements, {} groups",
                archetype.name,
                archetype.requirements.len(),
                archetype.balance_groups.len()
            );
        }
    }

    results
}

// ── 2. Compressor ───────────────────────────────────────────────────────

fn validate_compressor(verbose: bool) -> Vec<TestResult> {
    println!("--- Score Compressor ---");
    let mut results = Vec::new();

    for (raw, expected) in [(0.4, 0.24), (0.7, 0.56), (0.9, 0.86), (0.95, 0.96), (0.99, 0.99), (1.0, 1.0)] {
        let got = compress(raw);
        results.push(TestResult::check(
            &format!("compress_anchor_{}", raw),
            (got - expected).abs() < 1e-9,
            format!("compress({}) = {:.12}, expected {}", raw, got, expected),
        ));
    }

    let mut max_gap: f64 = 0.0;
    for b in [0.4, 0.7, 0.9, 0.95, 0.99] {
        max_gap = max_gap.max((compress(b) - compress(b - 1e-12)).abs());
    }
    results.push(TestResult::check(
        "compress_continuous",
        max_gap < 1e-9,
        format!("largest breakpoint gap {:.3e}", max_gap),
    ));

    let steps = 100_000;
    let mut increasing = true;
    let mut prev = compress(0.0);
    for i in 1..=steps {
        let y = compress(i as f64 / steps as f64);
        if y <= prev {
            increasing = false;
            break;
        }
        prev = y;
    }
    results.push(TestResult::check(
        "compress_strictly_increasing",
        increasing,
        format!("{} grid points", steps),
    ));

    if verbose {
        for raw in [0.1, 0.3, 0.5, 0.6, 0.8, 0.92, 0.97, 0.995] {
            println!("  compress({:.3}) = {:.4}", raw, compress(raw));
        }
    }

    results
}

// ── 3. Calibration scenarios ────────────────────────────────────────────

fn validate_scenarios(engine: &Engine, verbose: bool) -> Vec<TestResult> {
    println!("--- Calibration Scenarios ---");
    let mut results = Vec::new();

    let near_ideal = with_grape(values(0.95, 0.9, 0.5, 0.5, 0.5, 0.7), "Chenin Blanc", GrapeColor::White);
    let low_acid = with_grape(values(0.9, 0.4, 0.5, 0.5, 0.5, 0.5), "Chenin Blanc", GrapeColor::White);

    if let Some(sweet) = engine.registry().get("Sweet White Wine") {
        let ab = archetype_balance(&near_ideal.characteristics, sweet);
        results.push(TestResult::check(
            "sweet_white_near_ideal",
            (0.95..=1.0).contains(&ab),
            format!("archetype balance {:.4}", ab),
        ));
    } else {
        results.push(TestResult::check(
            "sweet_white_near_ideal",
            false,
            "Sweet White Wine missing from catalog".into(),
        ));
    }

    let best = engine.evaluate_sample(&near_ideal);
    let fallback = engine.evaluate_sample(&low_acid);
    results.push(TestResult::check(
        "low_acidity_fallback",
        !fallback.qualifies
            && fallback.raw_score == fallback.dynamic_balance
            && fallback.dynamic_balance < best.score,
        format!(
            "dynamic {:.4} vs best score {:.4}",
            fallback.dynamic_balance, best.score
        ),
    ));

    for (name, v) in [("all_zero", 0.0), ("all_one", 1.0)] {
        let r = engine.evaluate_sample(&with_grape(Characteristics::uniform(v), "Syrah", GrapeColor::Red));
        results.push(TestResult::check(
            &format!("{}_scores_low", name),
            r.score < 0.4,
            format!("score {:.4}, qualifies {}", r.score, r.qualifies),
        ));
    }

    let base = values(0.5, 0.45, 0.5, 0.5, 0.6, 0.5);
    let low_spice = engine.evaluate_sample(&Sample::new(base.with(Characteristic::Spice, 0.25)));
    let low_tannins = engine.evaluate_sample(&Sample::new(base.with(Characteristic::Tannins, 0.25)));
    results.push(TestResult::check(
        "acidity_down_spice_interaction",
        low_spice.score < low_tannins.score,
        format!(
            "low spice {:.4} < low tannins {:.4}",
            low_spice.score, low_tannins.score
        ),
    ));

    if verbose {
        println!(
            "  near-ideal sweet white: {:.4} ({}) via {:?}",
            best.score,
            best.tier.label(),
            best.matched_archetype
        );
    }

    results
}

// ── 4. Nearest archetype ────────────────────────────────────────────────

fn validate_nearest(engine: &Engine, verbose: bool) -> Vec<TestResult> {
    println!("--- Nearest Archetype ---");
    let mut results = Vec::new();

    for archetype in engine.registry().iter() {
        let mut mid = Characteristics::uniform(0.5);
        for (&c, r) in &archetype.ideal_ranges {
            mid.set(c, r.midpoint());
        }
        let mut sample = Sample::new(mid);
        if let Some(names) = archetype.required_grapes() {
            if let Some(name) = names.first() {
                sample = with_grape(mid, name, GrapeColor::White);
            }
        }

        let nearest = engine.nearest_archetype(&sample);
        let ok = nearest.as_ref().is_some_and(|n| n.qualifies);
        results.push(TestResult::check(
            &format!("nearest_{}", archetype.name),
            ok,
            format!("{:?}", nearest.map(|n| (n.name, n.distance))),
        ));
    }

    if verbose {
        println!("  {} archetypes checked at their midpoints", engine.registry().len());
    }

    results
}

// ── 5. Random sweep ─────────────────────────────────────────────────────

fn validate_random_sweep(engine: &Engine, verbose: bool) -> Vec<TestResult> {
    println!("--- Random Sweep ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(42);

    let samples = 20_000;
    let mut out_of_range = 0;
    let mut synergy_over_cap = 0;
    let mut qualified = 0;
    let mut tiers: BTreeMap<QualityTier, usize> = BTreeMap::new();

    for _ in 0..samples {
        let v = values(
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
            rng.gen_range(0.0..=1.0),
        );
        let color = if rng.gen_bool(0.5) {
            GrapeColor::Red
        } else {
            GrapeColor::White
        };
        let r = engine.evaluate_sample(&with_grape(v, "Field Blend", color));

        let in_unit = |x: f64| (0.0..=1.0).contains(&x);
        if !in_unit(r.score) || !in_unit(r.raw_score) || !in_unit(r.dynamic_balance) {
            out_of_range += 1;
        }
        if dynamic::synergy_bonus(&v, engine.rules()) > SYNERGY_CAP {
            synergy_over_cap += 1;
        }
        if r.qualifies {
            qualified += 1;
        }
        *tiers.entry(r.tier).or_default() += 1;
    }

    results.push(TestResult::check(
        "sweep_range_invariant",
        out_of_range == 0,
        format!("{}/{} samples out of [0, 1]", out_of_range, samples),
    ));
    results.push(TestResult::check(
        "sweep_synergy_cap",
        synergy_over_cap == 0,
        format!("{}/{} samples above cap", synergy_over_cap, samples),
    ));

    if verbose {
        println!("  {}/{} random samples qualified for an archetype", qualified, samples);
        for (tier, count) in &tiers {
            println!("  {:<14} {:>6}", tier.label(), count);
        }
    }

    results
}
