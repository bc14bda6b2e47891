//! Pure wine scoring logic for Vintage.
//!
//! This crate scores a wine sample (six characteristics plus optional
//! metadata) against a catalog of named archetypes and a universal balance
//! baseline, producing a final score in \[0, 1\] and the best-matching
//! archetype. Functions take plain data and return results; nothing here
//! touches a database, the network, or a UI.
//!
//! # Pipeline
//!
//! ```text
//! SampleRecord ─validate─▶ Sample
//!     │
//!     ├─▶ synergy bonus ─▶ dynamic balance (baseline + adjustment rules)
//!     ├─▶ qualifier ─▶ distance / balance score per qualifying archetype
//!     ▼
//! raw = max(best archetype balance, dynamic balance) ─▶ compress ─▶ score
//! ```
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`archetypes`] | Archetype definitions, catalog parsing, registry validation |
//! | [`characteristics`] | The six characteristics, intervals, deviation direction |
//! | [`compress`] | Piecewise score compressor and quality tiers |
//! | [`dynamic`] | Archetype-independent dynamic balance and synergy bonus |
//! | [`engine`] | Archetype matcher, nearest-archetype heuristic, batch scoring |
//! | [`error`] | Configuration and sample validation errors |
//! | [`qualifier`] | Hard requirement and ideal-range gate |
//! | [`rules`] | Baseline table, adjustment rules, synergy rules |
//! | [`sample`] | Sample records, metadata, validation |
//! | [`scoring`] | Distance and balance scores for one archetype |

pub mod archetypes;
pub mod characteristics;
pub mod compress;
pub mod dynamic;
pub mod engine;
pub mod error;
pub mod qualifier;
pub mod rules;
pub mod sample;
pub mod scoring;

pub use engine::{Engine, EngineConfig, Evaluation, NearestArchetype};
pub use error::{ConfigError, ValidationError};
