//! Samples — the wine records being scored.
//!
//! External producers (harvest, crushing, aging) hand over a [`SampleRecord`]
//! in which any field may be missing. [`Sample::try_from`] turns it into a
//! [`Sample`] whose six characteristics are guaranteed present, finite, and in
//! \[0.0, 1.0\]. Metadata stays optional: requirement checks treat a missing
//! field as "not satisfied", never as an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, Characteristics};
use crate::error::ValidationError;

/// Skin color of a grape variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrapeColor {
    Red,
    White,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grape {
    pub name: String,
    pub color: GrapeColor,
}

/// Where the grapes were grown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub soils: Vec<String>,
    #[serde(default)]
    pub terrain: Option<String>,
    /// Field is farmed ecologically.
    #[serde(default)]
    pub ecological: bool,
}

/// Optional facts about a sample, consulted only by requirement checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub quality: Option<f64>,
    pub vintage: Option<i32>,
    pub oxidation: Option<f64>,
    pub ripeness: Option<f64>,
    pub prestige: Option<f64>,
    pub grape: Option<Grape>,
    pub origin: Option<Origin>,
    /// Processing method, e.g. "traditional" or "carbonic".
    pub processing: Option<String>,
}

/// Unvalidated sample as delivered by a producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(default)]
    pub characteristics: BTreeMap<Characteristic, f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A sample that is ready to be scored. Serialized as a [`SampleRecord`], and
/// deserialization goes through the same validation as [`Sample::try_from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord", into = "SampleRecord")]
pub struct Sample {
    pub characteristics: Characteristics,
    pub metadata: Metadata,
}

impl Sample {
    /// Sample with no metadata.
    pub fn new(characteristics: Characteristics) -> Self {
        Self {
            characteristics,
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Parse and validate a JSON-encoded [`SampleRecord`].
    pub fn from_json(json: &str) -> Result<Sample, ValidationError> {
        let record: SampleRecord =
            serde_json::from_str(json).map_err(|e| ValidationError::Parse(e.to_string()))?;
        Sample::try_from(record)
    }

    pub fn get(&self, c: Characteristic) -> f64 {
        self.characteristics.get(c)
    }
}

impl TryFrom<SampleRecord> for Sample {
    type Error = ValidationError;

    fn try_from(record: SampleRecord) -> Result<Self, Self::Error> {
        let characteristics = validate_characteristics(&record.characteristics)?;
        Ok(Sample {
            characteristics,
            metadata: record.metadata,
        })
    }
}

impl TryFrom<&SampleRecord> for Sample {
    type Error = ValidationError;

    fn try_from(record: &SampleRecord) -> Result<Self, Self::Error> {
        let characteristics = validate_characteristics(&record.characteristics)?;
        Ok(Sample {
            characteristics,
            metadata: record.metadata.clone(),
        })
    }
}

impl From<Sample> for SampleRecord {
    fn from(sample: Sample) -> Self {
        SampleRecord {
            characteristics: sample.characteristics.iter().collect(),
            metadata: sample.metadata,
        }
    }
}

impl From<&Sample> for SampleRecord {
    fn from(sample: &Sample) -> Self {
        SampleRecord {
            characteristics: sample.characteristics.iter().collect(),
            metadata: sample.metadata.clone(),
        }
    }
}

fn validate_characteristics(
    values: &BTreeMap<Characteristic, f64>,
) -> Result<Characteristics, ValidationError> {
    let mut out = Characteristics::uniform(0.0);
    for c in Characteristic::ALL {
        let value = *values
            .get(&c)
            .ok_or(ValidationError::MissingCharacteristic(c))?;
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { characteristic: c });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::OutOfRange {
                characteristic: c,
                value,
            });
        }
        out.set(c, value);
    }
    Ok(out)
}
