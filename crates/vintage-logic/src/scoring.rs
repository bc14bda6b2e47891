//! Archetype-specific quality estimate: closeness to each ideal midpoint
//! (distance score) and internal consistency of balance groups (balance score).

use crate::archetypes::Archetype;
use crate::characteristics::Characteristics;

/// `(1 - d²)^weight`, clamped to 0 once `d` reaches 1.
fn closeness(d: f64, weight: f64) -> f64 {
    if d >= 1.0 {
        0.0
    } else {
        (1.0 - d * d).powf(weight)
    }
}

/// Weighted closeness of each characteristic to its ideal midpoint, in \[0, 1\].
///
/// For interval `[min, max]` with weight `w`: `d = |value - mid| / (max - min)`,
/// partial score `(1 - d²)^w`, averaged with weights `w`.
pub fn distance_score(values: &Characteristics, archetype: &Archetype) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for (&c, range) in &archetype.ideal_ranges {
        let width = range.width();
        if width <= 0.0 {
            continue;
        }
        let weight = archetype.weight(c);
        let d = (values.get(c) - range.midpoint()).abs() / width;
        weighted += closeness(d, weight) * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Weighted consistency of the archetype's balance groups, in \[0, 1\].
///
/// Each group scores `(1 - avg_pairwise_diff²)^w` with `w` the mean importance
/// of its members. Groups with fewer than two members are skipped; with no
/// scorable group the result is 1.0.
pub fn balance_score(values: &Characteristics, archetype: &Archetype) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for group in &archetype.balance_groups {
        if group.len() < 2 {
            continue;
        }

        let mut diff_sum = 0.0;
        let mut pairs = 0usize;
        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                diff_sum += (values.get(a) - values.get(b)).abs();
                pairs += 1;
            }
        }
        let avg_distance = diff_sum / pairs as f64;
        let weight =
            group.iter().map(|&c| archetype.weight(c)).sum::<f64>() / group.len() as f64;

        weighted += closeness(avg_distance, weight) * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Mean of [`distance_score`] and [`balance_score`].
pub fn archetype_balance(values: &Characteristics, archetype: &Archetype) -> f64 {
    (distance_score(values, archetype) + balance_score(values, archetype)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristics::Characteristic::*;

    fn sweet_white() -> Archetype {
        Archetype::new("Sweet White Wine")
            .ideal(Sweetness, 0.8, 1.0)
            .ideal(Acidity, 0.8, 1.0)
            .ideal(Tannins, 0.3, 0.7)
            .ideal(Aroma, 0.3, 0.7)
            .ideal(Body, 0.3, 0.7)
            .ideal(Spice, 0.3, 0.7)
            .weighted(Sweetness, 1.0)
            .weighted(Acidity, 1.0)
            .weighted(Tannins, 0.5)
            .weighted(Aroma, 0.5)
            .weighted(Body, 0.5)
            .weighted(Spice, 0.5)
            .group(&[Sweetness, Acidity])
    }

    fn near_ideal() -> Characteristics {
        Characteristics::uniform(0.5)
            .with(Sweetness, 0.95)
            .with(Acidity, 0.9)
            .with(Spice, 0.7)
    }

    #[test]
    fn test_perfect_midpoints_score_one() {
        let a = sweet_white();
        let v = Characteristics::uniform(0.5)
            .with(Sweetness, 0.9)
            .with(Acidity, 0.9);
        assert!((distance_score(&v, &a) - 1.0).abs() < 1e-12);
        assert!((balance_score(&v, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_near_ideal_distance_score() {
        // sweetness d=0.25 → 0.9375, spice d=0.5 → 0.75^0.5, rest exact.
        let expected = (0.9375 + 1.0 + 0.5 * 3.0 + 0.75f64.sqrt() * 0.5) / 4.0;
        let got = distance_score(&near_ideal(), &sweet_white());
        assert!((got - expected).abs() < 1e-9, "got {}", got);
    }

    #[test]
    fn test_near_ideal_archetype_balance_is_high() {
        let ab = archetype_balance(&near_ideal(), &sweet_white());
        assert!((0.95..=1.0).contains(&ab), "archetype balance {}", ab);
    }

    #[test]
    fn test_far_value_clamps_to_zero() {
        let a = Archetype::new("narrow").ideal(Body, 0.8, 0.9);
        let v = Characteristics::uniform(0.0);
        assert_eq!(distance_score(&v, &a), 0.0);
    }

    #[test]
    fn test_single_member_group_skipped() {
        let a = Archetype::new("solo").ideal(Body, 0.2, 0.6).group(&[Body]);
        assert_eq!(balance_score(&Characteristics::uniform(0.3), &a), 1.0);

        let b = a.group(&[Sweetness, Spice]);
        let v = Characteristics::uniform(0.5).with(Spice, 0.9);
        let expected = 1.0 - 0.4 * 0.4;
        assert!((balance_score(&v, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_balance_uses_mean_pairwise_distance() {
        let a = Archetype::new("trio")
            .ideal(Body, 0.2, 0.6)
            .group(&[Sweetness, Acidity, Tannins]);
        let v = Characteristics::uniform(0.5)
            .with(Sweetness, 0.2)
            .with(Acidity, 0.4)
            .with(Tannins, 0.8);
        // diffs: 0.2, 0.6, 0.4 → avg 0.4
        let expected = 1.0 - 0.16;
        assert!((balance_score(&v, &a) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_heavier_weight_is_stricter() {
        let light = Archetype::new("light").ideal(Body, 0.4, 0.6).weighted(Body, 0.5);
        let heavy = Archetype::new("heavy").ideal(Body, 0.4, 0.6).weighted(Body, 2.0);
        let v = Characteristics::uniform(0.55);
        assert!(distance_score(&v, &light) > distance_score(&v, &heavy));
    }
}
