//! Final score shaping — maps a raw \[0, 1\] score onto the reported score.
//!
//! | raw | shape | reported |
//! |-----|-------|----------|
//! | [0, 0.4) | quadratic | 0 → 0.24 |
//! | [0.4, 0.7) | logarithmic | 0.24 → 0.56 |
//! | [0.7, 0.9) | linear, slope 1.5 | 0.56 → 0.86 |
//! | [0.9, 0.95) | linear, slope 2 | 0.86 → 0.96 |
//! | [0.95, 0.99) | linear, slope 0.75 | 0.96 → 0.99 |
//! | [0.99, 1.0] | saturating exponential | 0.99 → 1.0 |
//!
//! Every segment starts exactly where the previous one ends, so the curve is
//! continuous and strictly increasing.

use serde::{Deserialize, Serialize};

/// Inner slope of the logarithmic segment.
const LOG_RATE: f64 = 3.33;
/// Rate of the saturating top segment.
const TOP_RATE: f64 = 10.0;

/// Reshape a raw score. Input is clamped to \[0, 1\]; NaN maps to 0.
pub fn compress(raw: f64) -> f64 {
    let raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };

    if raw < 0.4 {
        raw * raw * 1.5
    } else if raw < 0.7 {
        // Scaled so the segment spans exactly 0.24 → 0.56.
        let scale = 0.32 / (1.0 + 0.3 * LOG_RATE).ln();
        0.24 + (1.0 + (raw - 0.4) * LOG_RATE).ln() * scale
    } else if raw < 0.9 {
        0.56 + (raw - 0.7) * 1.5
    } else if raw < 0.95 {
        0.86 + (raw - 0.9) * 2.0
    } else if raw < 0.99 {
        0.96 + (raw - 0.95) * 0.75
    } else {
        let saturation = 1.0 - (-0.01 * TOP_RATE).exp();
        0.99 + (1.0 - (-(raw - 0.99) * TOP_RATE).exp()) / saturation * 0.01
    }
}

/// Named quality band for a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Undrinkable,
    Poor,
    BelowAverage,
    Average,
    AboveAverage,
    Good,
    VeryGood,
    Excellent,
    Superior,
    Exceptional,
    Legendary,
}

impl QualityTier {
    /// Tier for a final (compressed) score.
    pub fn from_score(score: f64) -> QualityTier {
        match score {
            s if s >= 0.99 => QualityTier::Legendary,
            s if s >= 0.95 => QualityTier::Exceptional,
            s if s >= 0.9 => QualityTier::Superior,
            s if s >= 0.8 => QualityTier::Excellent,
            s if s >= 0.7 => QualityTier::VeryGood,
            s if s >= 0.6 => QualityTier::Good,
            s if s >= 0.5 => QualityTier::AboveAverage,
            s if s >= 0.4 => QualityTier::Average,
            s if s >= 0.3 => QualityTier::BelowAverage,
            s if s >= 0.1 => QualityTier::Poor,
            _ => QualityTier::Undrinkable,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Undrinkable => "Undrinkable",
            QualityTier::Poor => "Poor",
            QualityTier::BelowAverage => "Below Average",
            QualityTier::Average => "Average",
            QualityTier::AboveAverage => "Above Average",
            QualityTier::Good => "Good",
            QualityTier::VeryGood => "Very Good",
            QualityTier::Excellent => "Excellent",
            QualityTier::Superior => "Superior",
            QualityTier::Exceptional => "Exceptional",
            QualityTier::Legendary => "Legendary",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BREAKPOINTS: [f64; 5] = [0.4, 0.7, 0.9, 0.95, 0.99];

    #[test]
    fn test_anchor_values() {
        assert_eq!(compress(0.0), 0.0);
        assert!((compress(0.4) - 0.24).abs() < 1e-9);
        assert!((compress(0.7) - 0.56).abs() < 1e-9);
        assert!((compress(0.9) - 0.86).abs() < 1e-9);
        assert!((compress(0.95) - 0.96).abs() < 1e-9);
        assert!((compress(0.99) - 0.99).abs() < 1e-9);
        assert!((compress(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_continuous_at_breakpoints() {
        for b in BREAKPOINTS {
            let left = compress(b - 1e-12);
            let right = compress(b);
            assert!((right - left).abs() < 1e-9, "discontinuity at {}", b);
        }
    }

    #[test]
    fn test_strictly_increasing_on_grid() {
        let mut prev = compress(0.0);
        for i in 1..=10_000 {
            let x = i as f64 / 10_000.0;
            let y = compress(x);
            assert!(y > prev, "not increasing at {}: {} <= {}", x, y, prev);
            prev = y;
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(compress(-0.5), 0.0);
        assert!((compress(1.5) - 1.0).abs() < 1e-12);
        assert_eq!(compress(f64::NAN), 0.0);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(QualityTier::from_score(0.0), QualityTier::Undrinkable);
        assert_eq!(QualityTier::from_score(0.45), QualityTier::Average);
        assert_eq!(QualityTier::from_score(0.995), QualityTier::Legendary);
        assert!(QualityTier::Good > QualityTier::Poor);
        assert_eq!(QualityTier::VeryGood.label(), "Very Good");
    }
}
