//! Archetype-independent balance configuration: the baseline "well-made wine"
//! table, cross-characteristic adjustment rules, and synergy rules.
//!
//! Adjustment rules are keyed by `(characteristic, direction)`, where the
//! direction says whether the sample sits above or below the baseline
//! midpoint. A rule either shifts another characteristic's acceptable range
//! or scales another characteristic's penalty bucket.
//!
//! | source | shift target | factor |
//! |--------|--------------|--------|
//! | acidity | sweetness | 0.4 |
//! | sweetness | acidity | 0.3 |
//! | body | tannins | 0.5 |
//! | body | spice | 0.3 |
//! | aroma | spice | 0.2 |
//!
//! Penalty curves on the `Down` side are steeper than their `Up` mirrors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, Characteristics, Direction, Interval};
use crate::error::ConfigError;

/// Upper bound on the summed synergy bonus.
pub const SYNERGY_CAP: f64 = 0.2;

/// Neutral interval per characteristic for a balanced wine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineTable {
    ranges: BTreeMap<Characteristic, Interval>,
}

impl Default for BaselineTable {
    fn default() -> Self {
        use Characteristic::*;
        Self {
            ranges: BTreeMap::from([
                (Acidity, Interval::new(0.4, 0.6)),
                (Aroma, Interval::new(0.3, 0.7)),
                (Body, Interval::new(0.4, 0.8)),
                (Spice, Interval::new(0.35, 0.65)),
                (Sweetness, Interval::new(0.4, 0.6)),
                (Tannins, Interval::new(0.35, 0.65)),
            ]),
        }
    }
}

impl BaselineTable {
    pub fn new(ranges: BTreeMap<Characteristic, Interval>) -> Result<Self, ConfigError> {
        let table = Self { ranges };
        table.validate()?;
        Ok(table)
    }

    pub fn get(&self, c: Characteristic) -> Option<Interval> {
        self.ranges.get(&c).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Characteristic, Interval)> + '_ {
        self.ranges.iter().map(|(&c, &i)| (c, i))
    }

    /// Every characteristic needs a finite interval with positive width.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for c in Characteristic::ALL {
            let range = self
                .get(c)
                .ok_or_else(|| ConfigError::InvalidBaseline(format!("missing {}", c)))?;
            if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
                return Err(ConfigError::InvalidBaseline(format!(
                    "{} range [{}, {}] must satisfy min < max",
                    c, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Multiplier curve for a penalty rule: `1 + slope·d + curvature·d²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PenaltyCurve {
    Linear { slope: f64 },
    Quadratic { slope: f64, curvature: f64 },
}

impl PenaltyCurve {
    pub fn eval(&self, deviation: f64) -> f64 {
        match *self {
            PenaltyCurve::Linear { slope } => 1.0 + slope * deviation,
            PenaltyCurve::Quadratic { slope, curvature } => {
                1.0 + slope * deviation + curvature * deviation * deviation
            }
        }
    }

    /// `(slope, curvature)`; a linear curve has zero curvature.
    pub fn coefficients(&self) -> (f64, f64) {
        match *self {
            PenaltyCurve::Linear { slope } => (slope, 0.0),
            PenaltyCurve::Quadratic { slope, curvature } => (slope, curvature),
        }
    }
}

/// What a triggered adjustment rule does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum RuleEffect {
    /// Move `target`'s acceptable interval by `factor · |deviation|`.
    ShiftRange { target: Characteristic, factor: f64 },
    /// Multiply `target`'s penalty bucket by `curve(|deviation|) · penalty_mod`.
    Penalty {
        target: Characteristic,
        curve: PenaltyCurve,
        penalty_mod: f64,
    },
}

impl RuleEffect {
    pub fn target(&self) -> Characteristic {
        match *self {
            RuleEffect::ShiftRange { target, .. } | RuleEffect::Penalty { target, .. } => target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub source: Characteristic,
    pub direction: Direction,
    pub effect: RuleEffect,
}

impl AdjustmentRule {
    /// A range-shift rule and its mirror: `Up` shifts by `+factor·d`, `Down` by `-factor·d`.
    pub fn shift(source: Characteristic, target: Characteristic, factor: f64) -> [AdjustmentRule; 2] {
        [
            AdjustmentRule {
                source,
                direction: Direction::Up,
                effect: RuleEffect::ShiftRange { target, factor },
            },
            AdjustmentRule {
                source,
                direction: Direction::Down,
                effect: RuleEffect::ShiftRange {
                    target,
                    factor: -factor,
                },
            },
        ]
    }

    pub fn penalty(
        source: Characteristic,
        direction: Direction,
        target: Characteristic,
        curve: PenaltyCurve,
        penalty_mod: f64,
    ) -> AdjustmentRule {
        AdjustmentRule {
            source,
            direction,
            effect: RuleEffect::Penalty {
                target,
                curve,
                penalty_mod,
            },
        }
    }
}

/// How a triggered synergy turns characteristic values into a bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynergyBonus {
    /// `scale · min(values)`
    MinOf { scale: f64 },
    /// `scale · mean(values)`
    MeanOf { scale: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub characteristic: Characteristic,
    pub range: Interval,
}

/// A combination of characteristics that reinforce each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyRule {
    pub name: String,
    /// Characteristics the bonus is computed from.
    pub characteristics: Vec<Characteristic>,
    /// All thresholds must hold for the rule to trigger.
    pub condition: Vec<Threshold>,
    pub bonus: SynergyBonus,
}

impl SynergyRule {
    pub fn is_triggered(&self, values: &Characteristics) -> bool {
        self.condition
            .iter()
            .all(|t| t.range.contains(values.get(t.characteristic)))
    }

    /// Bonus value, regardless of whether the condition holds.
    pub fn bonus_for(&self, values: &Characteristics) -> f64 {
        if self.characteristics.is_empty() {
            return 0.0;
        }
        let vals = self.characteristics.iter().map(|&c| values.get(c));
        let raw = match self.bonus {
            SynergyBonus::MinOf { scale } => scale * vals.fold(f64::INFINITY, f64::min),
            SynergyBonus::MeanOf { scale } => {
                scale * vals.sum::<f64>() / self.characteristics.len() as f64
            }
        };
        raw.max(0.0)
    }
}

/// Serialized form of [`DynamicRules`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub adjustments: Vec<AdjustmentRule>,
    pub synergies: Vec<SynergyRule>,
}

/// Adjustment rules indexed by `(source, direction)`, plus synergy rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleSet", into = "RuleSet")]
pub struct DynamicRules {
    index: BTreeMap<(Characteristic, Direction), Vec<RuleEffect>>,
    synergies: Vec<SynergyRule>,
}

impl From<RuleSet> for DynamicRules {
    fn from(set: RuleSet) -> Self {
        let mut index: BTreeMap<(Characteristic, Direction), Vec<RuleEffect>> = BTreeMap::new();
        for rule in set.adjustments {
            index
                .entry((rule.source, rule.direction))
                .or_default()
                .push(rule.effect);
        }
        Self {
            index,
            synergies: set.synergies,
        }
    }
}

impl From<DynamicRules> for RuleSet {
    fn from(rules: DynamicRules) -> Self {
        let adjustments = rules
            .index
            .into_iter()
            .flat_map(|((source, direction), effects)| {
                effects.into_iter().map(move |effect| AdjustmentRule {
                    source,
                    direction,
                    effect,
                })
            })
            .collect();
        RuleSet {
            adjustments,
            synergies: rules.synergies,
        }
    }
}

impl DynamicRules {
    pub fn new(adjustments: Vec<AdjustmentRule>, synergies: Vec<SynergyRule>) -> Self {
        RuleSet {
            adjustments,
            synergies,
        }
        .into()
    }

    /// Rules triggered when `source` deviates in `direction`.
    pub fn rules_for(&self, source: Characteristic, direction: Direction) -> &[RuleEffect] {
        self.index
            .get(&(source, direction))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn synergies(&self) -> &[SynergyRule] {
        &self.synergies
    }

    pub fn adjustment_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    /// Reject non-finite factors, non-positive penalty modifiers, penalty curves
    /// that can fall below 1.0, and negative synergy scales.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (&(source, direction), effects) in &self.index {
            for effect in effects {
                match *effect {
                    RuleEffect::ShiftRange { factor, .. } if !factor.is_finite() => {
                        return Err(ConfigError::InvalidRule(format!(
                            "{} {:?}: shift factor {} is not finite",
                            source, direction, factor
                        )));
                    }
                    RuleEffect::Penalty { penalty_mod, .. }
                        if !penalty_mod.is_finite() || penalty_mod <= 0.0 =>
                    {
                        return Err(ConfigError::InvalidRule(format!(
                            "{} {:?}: penalty_mod must be positive, got {}",
                            source, direction, penalty_mod
                        )));
                    }
                    RuleEffect::Penalty { curve, .. } => {
                        let (slope, curvature) = curve.coefficients();
                        let valid = |k: f64| k.is_finite() && k >= 0.0;
                        if !valid(slope) || !valid(curvature) {
                            return Err(ConfigError::InvalidRule(format!(
                                "{} {:?}: penalty curve coefficients must be non-negative, got slope {} curvature {}",
                                source, direction, slope, curvature
                            )));
                        }
                    }
                    _ => {}
                }
            }
        }
        for rule in &self.synergies {
            let scale = match rule.bonus {
                SynergyBonus::MinOf { scale } | SynergyBonus::MeanOf { scale } => scale,
            };
            if !scale.is_finite() || scale < 0.0 {
                return Err(ConfigError::InvalidRule(format!(
                    "synergy '{}': scale must be non-negative, got {}",
                    rule.name, scale
                )));
            }
            if rule.characteristics.is_empty() {
                return Err(ConfigError::InvalidRule(format!(
                    "synergy '{}' names no characteristics",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for DynamicRules {
    fn default() -> Self {
        use Characteristic::*;
        use Direction::{Down, Up};
        use PenaltyCurve::{Linear, Quadratic};

        let mut adjustments = Vec::new();
        adjustments.extend(AdjustmentRule::shift(Acidity, Sweetness, 0.4));
        adjustments.extend(AdjustmentRule::shift(Sweetness, Acidity, 0.3));
        adjustments.extend(AdjustmentRule::shift(Body, Tannins, 0.5));
        adjustments.extend(AdjustmentRule::shift(Body, Spice, 0.3));
        adjustments.extend(AdjustmentRule::shift(Aroma, Spice, 0.2));

        let pen = AdjustmentRule::penalty;
        adjustments.extend([
            pen(Acidity, Up, Spice, Linear { slope: 1.5 }, 1.0),
            pen(Acidity, Down, Spice, Quadratic { slope: 3.0, curvature: 10.0 }, 1.2),
            pen(Sweetness, Up, Acidity, Linear { slope: 2.0 }, 1.0),
            pen(Sweetness, Down, Body, Quadratic { slope: 2.5, curvature: 6.0 }, 1.0),
            pen(Tannins, Up, Body, Linear { slope: 1.5 }, 1.0),
            pen(Tannins, Down, Aroma, Quadratic { slope: 2.0, curvature: 5.0 }, 1.0),
            pen(Body, Up, Aroma, Linear { slope: 1.0 }, 1.0),
            pen(Body, Down, Sweetness, Quadratic { slope: 2.0, curvature: 4.0 }, 1.0),
            pen(Spice, Up, Acidity, Linear { slope: 1.0 }, 1.0),
            pen(Spice, Down, Aroma, Quadratic { slope: 1.5, curvature: 4.0 }, 1.0),
            pen(Aroma, Up, Sweetness, Linear { slope: 0.8 }, 1.0),
            pen(Aroma, Down, Body, Quadratic { slope: 2.0, curvature: 5.0 }, 1.0),
        ]);

        let at_least = |c: Characteristic, min: f64| Threshold {
            characteristic: c,
            range: Interval::new(min, 1.0),
        };
        let synergies = vec![
            SynergyRule {
                name: "structured".into(),
                characteristics: vec![Acidity, Tannins],
                condition: vec![at_least(Acidity, 0.6), at_least(Tannins, 0.6)],
                bonus: SynergyBonus::MinOf { scale: 0.1 },
            },
            SynergyRule {
                name: "warm and full".into(),
                characteristics: vec![Body],
                condition: vec![
                    at_least(Body, 0.6),
                    Threshold {
                        characteristic: Spice,
                        range: Interval::new(0.5, 0.8),
                    },
                ],
                bonus: SynergyBonus::MeanOf { scale: 0.08 },
            },
            SynergyRule {
                name: "bright sweetness".into(),
                characteristics: vec![Sweetness, Acidity],
                condition: vec![
                    at_least(Sweetness, 0.6),
                    at_least(Acidity, 0.6),
                    at_least(Aroma, 0.5),
                ],
                bonus: SynergyBonus::MeanOf { scale: 0.1 },
            },
        ];

        DynamicRules::new(adjustments, synergies)
    }
}
