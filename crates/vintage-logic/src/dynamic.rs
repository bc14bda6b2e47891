//! Dynamic balance — scores a sample against the universal baseline table,
//! independent of any archetype.
//!
//! ```text
//! 1. ranges    = baseline, shifted by range-shift rules of deviating characteristics
//! 2. buckets   = product of penalty-rule multipliers per target (default 1.0)
//! 3. raw_c     = |value - mid|                              if value in range
//!              = |bound - mid| + overflow(outside distance)  otherwise
//!    raw_c    *= bucket_c × (1 - synergy)
//!    ded_c     = 1 - e^(-raw_c)
//! 4. balance   = 1 - mean(ded_c)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, Characteristics, Direction, Interval};
use crate::rules::{BaselineTable, DynamicRules, RuleEffect, SYNERGY_CAP};

/// Width of one overflow step beyond a range bound.
pub const OVERFLOW_STEP: f64 = 0.1;

/// Sum of all triggered synergy bonuses, capped at [`SYNERGY_CAP`].
pub fn synergy_bonus(values: &Characteristics, rules: &DynamicRules) -> f64 {
    let total: f64 = rules
        .synergies()
        .iter()
        .filter(|rule| rule.is_triggered(values))
        .map(|rule| rule.bonus_for(values))
        .sum();
    total.clamp(0.0, SYNERGY_CAP)
}

/// Deviating characteristics with their direction and absolute deviation
/// from the baseline midpoint.
fn deviations<'a>(
    values: &'a Characteristics,
    baseline: &'a BaselineTable,
) -> impl Iterator<Item = (Characteristic, Direction, f64)> + 'a {
    baseline.iter().filter_map(move |(c, range)| {
        let deviation = values.get(c) - range.midpoint();
        Direction::of(deviation).map(|dir| (c, dir, deviation.abs()))
    })
}

/// Baseline ranges after applying every triggered range-shift rule.
pub fn adjusted_ranges(
    values: &Characteristics,
    baseline: &BaselineTable,
    rules: &DynamicRules,
) -> BTreeMap<Characteristic, Interval> {
    let mut ranges: BTreeMap<Characteristic, Interval> = baseline.iter().collect();

    for (source, direction, d) in deviations(values, baseline) {
        for effect in rules.rules_for(source, direction) {
            if let RuleEffect::ShiftRange { target, factor } = *effect {
                if let Some(range) = ranges.get_mut(&target) {
                    *range = range.shifted(factor * d);
                }
            }
        }
    }

    ranges
}

/// Penalty multiplier per target characteristic. Untouched targets are absent (1.0).
pub fn penalty_buckets(
    values: &Characteristics,
    baseline: &BaselineTable,
    rules: &DynamicRules,
) -> BTreeMap<Characteristic, f64> {
    let mut buckets = BTreeMap::new();

    for (source, direction, d) in deviations(values, baseline) {
        for effect in rules.rules_for(source, direction) {
            if let RuleEffect::Penalty {
                target,
                curve,
                penalty_mod,
            } = *effect
            {
                *buckets.entry(target).or_insert(1.0) *= curve.eval(d) * penalty_mod;
            }
        }
    }

    buckets
}

/// Superlinear penalty for a value `distance` beyond its range bound.
///
/// The distance is cut into [`OVERFLOW_STEP`]-wide steps; step `i` (from 0)
/// costs `step_size × 2^(i+1)`, so each further tenth doubles in price.
pub fn overflow_penalty(distance: f64) -> f64 {
    if distance <= 0.0 {
        return 0.0;
    }
    if !distance.is_finite() {
        return f64::INFINITY;
    }

    let full_steps = (distance / OVERFLOW_STEP).floor() as i32;
    let mut penalty = 0.0;
    for i in 0..full_steps {
        penalty += OVERFLOW_STEP * 2f64.powi(i + 1);
    }
    let rest = distance - full_steps as f64 * OVERFLOW_STEP;
    if rest > 0.0 {
        penalty += rest * 2f64.powi(full_steps + 1);
    }
    penalty
}

/// Per-characteristic detail of a dynamic balance computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub characteristic: Characteristic,
    pub value: f64,
    /// Adjusted acceptable interval.
    pub range: Interval,
    /// Penalty bucket multiplier (1.0 when no rule touched it).
    pub penalty: f64,
    /// Deduction before normalization, after penalty and synergy.
    pub raw: f64,
    /// `1 - e^(-raw)`, in \[0, 1).
    pub normalized: f64,
}

/// Deductions for every characteristic in the adjusted range table.
pub fn dynamic_breakdown(
    values: &Characteristics,
    baseline: &BaselineTable,
    rules: &DynamicRules,
    synergy_bonus: f64,
) -> Vec<Deduction> {
    let ranges = adjusted_ranges(values, baseline, rules);
    let buckets = penalty_buckets(values, baseline, rules);
    let discount = 1.0 - synergy_bonus.clamp(0.0, SYNERGY_CAP);

    ranges
        .into_iter()
        .map(|(c, range)| {
            let value = values.get(c);
            let mid = range.midpoint();

            let base = if range.contains(value) {
                (value - mid).abs()
            } else {
                let bound = range.nearest_bound(value);
                (bound - mid).abs() + overflow_penalty(range.distance_outside(value))
            };

            let penalty = buckets.get(&c).copied().unwrap_or(1.0);
            let raw = base * penalty * discount;
            Deduction {
                characteristic: c,
                value,
                range,
                penalty,
                raw,
                normalized: 1.0 - (-raw).exp(),
            }
        })
        .collect()
}

/// Archetype-independent balance score in \[0, 1\].
pub fn dynamic_balance(
    values: &Characteristics,
    baseline: &BaselineTable,
    rules: &DynamicRules,
    synergy_bonus: f64,
) -> f64 {
    let deductions = dynamic_breakdown(values, baseline, rules, synergy_bonus);
    if deductions.is_empty() {
        return 1.0;
    }
    let total: f64 = deductions.iter().map(|d| d.normalized).sum();
    (1.0 - total / deductions.len() as f64).clamp(0.0, 1.0)
}
