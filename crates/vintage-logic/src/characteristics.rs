//! The six wine characteristics and the interval arithmetic shared by every scorer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the six canonical wine characteristics, each measured in \[0.0, 1.0\].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Characteristic {
    Sweetness,
    Acidity,
    Tannins,
    Aroma,
    Body,
    Spice,
}

impl Characteristic {
    /// All characteristics in canonical order.
    pub const ALL: [Characteristic; 6] = [
        Characteristic::Sweetness,
        Characteristic::Acidity,
        Characteristic::Tannins,
        Characteristic::Aroma,
        Characteristic::Body,
        Characteristic::Spice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Characteristic::Sweetness => "sweetness",
            Characteristic::Acidity => "acidity",
            Characteristic::Tannins => "tannins",
            Characteristic::Aroma => "aroma",
            Characteristic::Body => "body",
            Characteristic::Spice => "spice",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Characteristic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Characteristic::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown characteristic '{}'", s))
    }
}

/// Which side of a baseline midpoint a value sits on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Direction of a signed deviation, `None` when the value sits exactly on the midpoint.
    pub fn of(deviation: f64) -> Option<Direction> {
        if deviation > 0.0 {
            Some(Direction::Up)
        } else if deviation < 0.0 {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// +1.0 for `Up`, -1.0 for `Down`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }
}

/// Closed interval `[min, max]`. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Inclusive containment.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Same width, both bounds moved by `delta`.
    pub fn shifted(&self, delta: f64) -> Interval {
        Interval::new(self.min + delta, self.max + delta)
    }

    /// How far `value` lies outside the interval (0.0 when inside).
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }

    /// The bound closest to `value`.
    pub fn nearest_bound(&self, value: f64) -> f64 {
        if (value - self.min).abs() <= (value - self.max).abs() {
            self.min
        } else {
            self.max
        }
    }
}

impl From<(f64, f64)> for Interval {
    fn from((min, max): (f64, f64)) -> Self {
        Interval::new(min, max)
    }
}

impl From<Interval> for (f64, f64) {
    fn from(i: Interval) -> Self {
        (i.min, i.max)
    }
}

/// A validated, complete set of the six characteristic values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    pub sweetness: f64,
    pub acidity: f64,
    pub tannins: f64,
    pub aroma: f64,
    pub body: f64,
    pub spice: f64,
}

impl Characteristics {
    /// Every characteristic set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            sweetness: value,
            acidity: value,
            tannins: value,
            aroma: value,
            body: value,
            spice: value,
        }
    }

    pub fn get(&self, c: Characteristic) -> f64 {
        match c {
            Characteristic::Sweetness => self.sweetness,
            Characteristic::Acidity => self.acidity,
            Characteristic::Tannins => self.tannins,
            Characteristic::Aroma => self.aroma,
            Characteristic::Body => self.body,
            Characteristic::Spice => self.spice,
        }
    }

    pub fn set(&mut self, c: Characteristic, value: f64) {
        match c {
            Characteristic::Sweetness => self.sweetness = value,
            Characteristic::Acidity => self.acidity = value,
            Characteristic::Tannins => self.tannins = value,
            Characteristic::Aroma => self.aroma = value,
            Characteristic::Body => self.body = value,
            Characteristic::Spice => self.spice = value,
        }
    }

    /// Copy with one characteristic replaced.
    pub fn with(mut self, c: Characteristic, value: f64) -> Self {
        self.set(c, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Characteristic, f64)> + '_ {
        Characteristic::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}
