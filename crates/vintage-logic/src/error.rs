//! Error types for configuration loading and per-call sample validation.

use crate::characteristics::Characteristic;

/// A malformed archetype catalog, baseline table, or rule set.
///
/// Raised only while building an [`Engine`](crate::engine::Engine); no engine
/// exists if construction fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("archetype '{archetype}': ideal range for {characteristic} has min {min} > max {max}")]
    InvertedRange {
        archetype: String,
        characteristic: Characteristic,
        min: f64,
        max: f64,
    },

    #[error("archetype '{archetype}': ideal range for {characteristic} has zero width")]
    ZeroWidthRange {
        archetype: String,
        characteristic: Characteristic,
    },

    #[error("archetype '{archetype}': importance for {characteristic} must be positive, got {weight}")]
    NonPositiveWeight {
        archetype: String,
        characteristic: Characteristic,
        weight: f64,
    },

    #[error("archetype '{archetype}': unknown characteristic '{name}'")]
    UnknownCharacteristic { archetype: String, name: String },

    #[error("archetype '{archetype}': balance group {index} is empty")]
    EmptyBalanceGroup { archetype: String, index: usize },

    #[error("archetype '{0}' is defined more than once")]
    DuplicateArchetype(String),

    #[error("archetype registry is empty")]
    EmptyRegistry,

    #[error("baseline table: {0}")]
    InvalidBaseline(String),

    #[error("adjustment rules: {0}")]
    InvalidRule(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// A sample that cannot be scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("sample is missing characteristic {0}")]
    MissingCharacteristic(Characteristic),

    #[error("characteristic {characteristic} is not a finite number")]
    NotFinite { characteristic: Characteristic },

    #[error("characteristic {characteristic} = {value} is outside [0, 1]")]
    OutOfRange {
        characteristic: Characteristic,
        value: f64,
    },

    #[error("failed to parse sample: {0}")]
    Parse(String),
}
