use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::core::GameError;

/// Marks needed to close a target
pub const MARKS_TO_CLOSE: u8 = 3;

/// The seven Cricket targets, in board order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum Target {
    Twenty,
    Nineteen,
    Eighteen,
    Seventeen,
    Sixteen,
    Fifteen,
    Bull,
}

impl Target {
    /// Points scored per excess mark
    pub fn value(self) -> u32 {
        match self {
            Target::Twenty => 20,
            Target::Nineteen => 19,
            Target::Eighteen => 18,
            Target::Seventeen => 17,
            Target::Sixteen => 16,
            Target::Fifteen => 15,
            Target::Bull => 25,
        }
    }

    pub fn all() -> impl Iterator<Item = Target> {
        Target::iter()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Bull => write!(f, "bull"),
            other => write!(f, "{}", other.value()),
        }
    }
}

impl TryFrom<&str> for Target {
    type Error = GameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "20" => Ok(Target::Twenty),
            "19" => Ok(Target::Nineteen),
            "18" => Ok(Target::Eighteen),
            "17" => Ok(Target::Seventeen),
            "16" => Ok(Target::Sixteen),
            "15" => Ok(Target::Fifteen),
            "bull" | "b" | "25" => Ok(Target::Bull),
            other => Err(GameError::UnknownTarget(other.to_string())),
        }
    }
}

/// How many marks a single dart is worth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplier {
    Single = 1,
    Double = 2,
    Triple = 3,
}

impl Multiplier {
    pub fn marks(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Multiplier {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Multiplier::Single),
            2 => Ok(Multiplier::Double),
            3 => Ok(Multiplier::Triple),
            other => Err(GameError::InvalidMultiplier(other)),
        }
    }
}

/// Per-target mark counts for one player in one match.
///
/// Serialized as a map keyed by target label (`"20"` .. `"15"`, `"bull"`);
/// targets missing from the input default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marks {
    #[serde(rename = "20", default)]
    twenty: u8,
    #[serde(rename = "19", default)]
    nineteen: u8,
    #[serde(rename = "18", default)]
    eighteen: u8,
    #[serde(rename = "17", default)]
    seventeen: u8,
    #[serde(rename = "16", default)]
    sixteen: u8,
    #[serde(rename = "15", default)]
    fifteen: u8,
    #[serde(default)]
    bull: u8,
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: Target) -> u8 {
        self[target]
    }

    pub fn is_closed(&self, target: Target) -> bool {
        self[target] >= MARKS_TO_CLOSE
    }

    pub fn all_closed(&self) -> bool {
        Target::all().all(|target| self.is_closed(target))
    }

    pub fn total(&self) -> u32 {
        Target::all().map(|target| u32::from(self[target])).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Target, u8)> + '_ {
        Target::all().map(move |target| (target, self[target]))
    }

    fn field(&self, target: Target) -> &u8 {
        match target {
            Target::Twenty => &self.twenty,
            Target::Nineteen => &self.nineteen,
            Target::Eighteen => &self.eighteen,
            Target::Seventeen => &self.seventeen,
            Target::Sixteen => &self.sixteen,
            Target::Fifteen => &self.fifteen,
            Target::Bull => &self.bull,
        }
    }

    fn field_mut(&mut self, target: Target) -> &mut u8 {
        match target {
            Target::Twenty => &mut self.twenty,
            Target::Nineteen => &mut self.nineteen,
            Target::Eighteen => &mut self.eighteen,
            Target::Seventeen => &mut self.seventeen,
            Target::Sixteen => &mut self.sixteen,
            Target::Fifteen => &mut self.fifteen,
            Target::Bull => &mut self.bull,
        }
    }
}

impl Index<Target> for Marks {
    type Output = u8;

    fn index(&self, target: Target) -> &u8 {
        self.field(target)
    }
}

impl IndexMut<Target> for Marks {
    fn index_mut(&mut self, target: Target) -> &mut u8 {
        self.field_mut(target)
    }
}
