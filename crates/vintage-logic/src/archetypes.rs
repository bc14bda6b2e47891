//! Wine archetypes — named target styles and the registry that holds them.
//!
//! An archetype combines hard requirements (grape, quality, vintage, ...),
//! optional regional and processing constraints, and an ideal interval per
//! characteristic with importance weights and balance groups. Archetypes are
//! authored as data ([`ArchetypeDef`], see `data/archetypes.json`) and become
//! usable only after [`ArchetypeRegistry`] has validated them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::characteristics::{Characteristic, Interval};
use crate::error::ConfigError;
use crate::sample::GrapeColor;

/// Default catalog shipped with the engine.
pub const BUILTIN_CATALOG: &str = include_str!("../../../data/archetypes.json");

/// A hard requirement on sample metadata. All requirements on an archetype are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    GrapeColor { color: GrapeColor },
    /// Grape variety must be one of `names`.
    Grape { names: Vec<String> },
    MinQuality { value: f64 },
    MinVintage { year: i32 },
    MinPrestige { value: f64 },
    Oxidation { range: Interval },
    Ripeness { range: Interval },
    /// Any requirement kind this engine does not know. Never satisfied.
    #[serde(other)]
    Unrecognized,
}

/// Keys a catalog entry carries that this engine does not understand.
pub type UnrecognizedKeys = BTreeMap<String, serde_json::Value>;

/// Where the grapes must come from. Each `None` field is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalRequirements {
    pub country: Option<String>,
    pub regions: Option<Vec<String>>,
    pub soils: Option<Vec<String>>,
    pub terrains: Option<Vec<String>>,
    /// Any entry here makes the block unsatisfiable.
    #[serde(flatten)]
    pub unrecognized: UnrecognizedKeys,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingRequirements {
    pub require_ecological: bool,
    /// Allow-list of processing methods.
    pub methods: Option<Vec<String>>,
    /// Any entry here makes the block unsatisfiable.
    #[serde(flatten)]
    pub unrecognized: UnrecognizedKeys,
}

/// Archetype as authored in a catalog file. Characteristic names are still raw strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeDef {
    pub name: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub regional: Option<RegionalRequirements>,
    #[serde(default)]
    pub processing: Option<ProcessingRequirements>,
    pub ideal_ranges: BTreeMap<String, Interval>,
    #[serde(default)]
    pub importance: BTreeMap<String, f64>,
    #[serde(default)]
    pub balance_groups: Vec<Vec<String>>,
    #[serde(flatten)]
    pub unrecognized: UnrecognizedKeys,
}

/// Versioned catalog file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u32,
    pub archetypes: Vec<ArchetypeDef>,
}

/// A named target style.
#[derive(Debug, Clone, PartialEq)]
pub struct Archetype {
    pub name: String,
    pub requirements: Vec<Requirement>,
    pub regional: Option<RegionalRequirements>,
    pub processing: Option<ProcessingRequirements>,
    pub ideal_ranges: BTreeMap<Characteristic, Interval>,
    pub importance: BTreeMap<Characteristic, f64>,
    pub balance_groups: Vec<Vec<Characteristic>>,
    /// Top-level requirement keys not understood by this engine. Never satisfied.
    pub unrecognized: UnrecognizedKeys,
}

impl Archetype {
    /// Empty archetype; add ranges and constraints with the builder methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            regional: None,
            processing: None,
            ideal_ranges: BTreeMap::new(),
            importance: BTreeMap::new(),
            balance_groups: Vec::new(),
            unrecognized: UnrecognizedKeys::new(),
        }
    }

    pub fn ideal(mut self, c: Characteristic, min: f64, max: f64) -> Self {
        self.ideal_ranges.insert(c, Interval::new(min, max));
        self
    }

    pub fn weighted(mut self, c: Characteristic, weight: f64) -> Self {
        self.importance.insert(c, weight);
        self
    }

    pub fn group(mut self, members: &[Characteristic]) -> Self {
        self.balance_groups.push(members.to_vec());
        self
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn regional(mut self, regional: RegionalRequirements) -> Self {
        self.regional = Some(regional);
        self
    }

    pub fn processing(mut self, processing: ProcessingRequirements) -> Self {
        self.processing = Some(processing);
        self
    }

    /// Importance of a characteristic (1.0 when not specified).
    pub fn weight(&self, c: Characteristic) -> f64 {
        self.importance.get(&c).copied().unwrap_or(1.0)
    }

    /// Grape names this archetype is restricted to, if any.
    pub fn required_grapes(&self) -> Option<&[String]> {
        self.requirements.iter().find_map(|r| match r {
            Requirement::Grape { names } => Some(names.as_slice()),
            _ => None,
        })
    }

    /// Check structural invariants: ranges ordered and non-degenerate,
    /// weights positive, balance groups non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (&c, range) in &self.ideal_ranges {
            if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
                return Err(ConfigError::InvertedRange {
                    archetype: self.name.clone(),
                    characteristic: c,
                    min: range.min,
                    max: range.max,
                });
            }
            if range.width() == 0.0 {
                return Err(ConfigError::ZeroWidthRange {
                    archetype: self.name.clone(),
                    characteristic: c,
                });
            }
        }
        for (&c, &weight) in &self.importance {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ConfigError::NonPositiveWeight {
                    archetype: self.name.clone(),
                    characteristic: c,
                    weight,
                });
            }
        }
        for (index, group) in self.balance_groups.iter().enumerate() {
            if group.is_empty() {
                return Err(ConfigError::EmptyBalanceGroup {
                    archetype: self.name.clone(),
                    index,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<ArchetypeDef> for Archetype {
    type Error = ConfigError;

    fn try_from(def: ArchetypeDef) -> Result<Self, Self::Error> {
        let parse = |name: &str| -> Result<Characteristic, ConfigError> {
            name.parse()
                .map_err(|_| ConfigError::UnknownCharacteristic {
                    archetype: def.name.clone(),
                    name: name.to_string(),
                })
        };

        let mut ideal_ranges = BTreeMap::new();
        for (name, range) in &def.ideal_ranges {
            ideal_ranges.insert(parse(name)?, *range);
        }
        let mut importance = BTreeMap::new();
        for (name, weight) in &def.importance {
            importance.insert(parse(name)?, *weight);
        }
        let mut balance_groups = Vec::with_capacity(def.balance_groups.len());
        for group in &def.balance_groups {
            let members = group
                .iter()
                .map(|name| parse(name))
                .collect::<Result<Vec<_>, _>>()?;
            balance_groups.push(members);
        }

        Ok(Archetype {
            name: def.name.clone(),
            requirements: def.requirements.clone(),
            regional: def.regional.clone(),
            processing: def.processing.clone(),
            ideal_ranges,
            importance,
            balance_groups,
            unrecognized: def.unrecognized.clone(),
        })
    }
}

impl From<&Archetype> for ArchetypeDef {
    fn from(a: &Archetype) -> Self {
        ArchetypeDef {
            name: a.name.clone(),
            requirements: a.requirements.clone(),
            regional: a.regional.clone(),
            processing: a.processing.clone(),
            ideal_ranges: a
                .ideal_ranges
                .iter()
                .map(|(c, r)| (c.name().to_string(), *r))
                .collect(),
            importance: a
                .importance
                .iter()
                .map(|(c, w)| (c.name().to_string(), *w))
                .collect(),
            balance_groups: a
                .balance_groups
                .iter()
                .map(|g| g.iter().map(|c| c.name().to_string()).collect())
                .collect(),
            unrecognized: a.unrecognized.clone(),
        }
    }
}

/// Validated, read-only collection of archetypes in catalog order.
#[derive(Debug, Clone)]
pub struct ArchetypeRegistry {
    archetypes: Vec<Archetype>,
}

impl ArchetypeRegistry {
    /// Validate every archetype and reject duplicate names.
    pub fn new(archetypes: Vec<Archetype>) -> Result<Self, ConfigError> {
        if archetypes.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        let mut seen = HashSet::new();
        for archetype in &archetypes {
            archetype.validate()?;
            if !seen.insert(archetype.name.as_str()) {
                return Err(ConfigError::DuplicateArchetype(archetype.name.clone()));
            }
        }
        Ok(Self { archetypes })
    }

    pub fn from_defs(defs: Vec<ArchetypeDef>) -> Result<Self, ConfigError> {
        let archetypes = defs
            .into_iter()
            .map(Archetype::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(archetypes)
    }

    /// Parse a catalog document (see [`Catalog`]).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_defs(catalog.archetypes)
    }

    /// The embedded default catalog.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Parse only the raw definitions of the embedded catalog.
pub fn builtin_defs() -> Result<Vec<ArchetypeDef>, ConfigError> {
    let catalog: Catalog =
        serde_json::from_str(BUILTIN_CATALOG).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(catalog.archetypes)
}
