//! Conviction: the lock-duration multiplier applied when the proxy votes.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conviction as understood by the `convictionVoting` pallet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conviction {
    /// 0.1x votes, no lock.
    #[default]
    None,
    Locked1x,
    Locked2x,
    Locked3x,
    Locked4x,
    Locked5x,
    Locked6x,
}

impl Conviction {
    /// Vote weight multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::None => 0.1,
            Self::Locked1x => 1.0,
            Self::Locked2x => 2.0,
            Self::Locked3x => 3.0,
            Self::Locked4x => 4.0,
            Self::Locked5x => 5.0,
            Self::Locked6x => 6.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Locked1x => "Locked1x",
            Self::Locked2x => "Locked2x",
            Self::Locked3x => "Locked3x",
            Self::Locked4x => "Locked4x",
            Self::Locked5x => "Locked5x",
            Self::Locked6x => "Locked6x",
        }
    }
}

impl fmt::Display for Conviction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Conviction {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "0.1x" => Ok(Self::None),
            "locked1x" | "1x" => Ok(Self::Locked1x),
            "locked2x" | "2x" => Ok(Self::Locked2x),
            "locked3x" | "3x" => Ok(Self::Locked3x),
            "locked4x" | "4x" => Ok(Self::Locked4x),
            "locked5x" | "5x" => Ok(Self::Locked5x),
            "locked6x" | "6x" => Ok(Self::Locked6x),
            _ => Err(TypesError::UnknownConviction(s.to_string())),
        }
    }
}
