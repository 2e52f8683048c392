//! Network identifier.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which relay chain the proxy votes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Kusama,
    Polkadot,
}

impl NetworkId {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kusama => "kusama",
            Self::Polkadot => "polkadot",
        }
    }

    /// Native token symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Kusama => "KSM",
            Self::Polkadot => "DOT",
        }
    }

    /// Number of decimals of the native token.
    pub fn token_decimals(&self) -> u32 {
        match self {
            Self::Kusama => 12,
            Self::Polkadot => 10,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kusama" | "ksm" => Ok(Self::Kusama),
            "polkadot" | "dot" => Ok(Self::Polkadot),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}
