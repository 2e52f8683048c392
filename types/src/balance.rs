//! Proxy account balance.
//!
//! Balances are raw chain units (planck) as `u128` to avoid floating-point
//! comparisons against the balance floor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A free balance in raw chain units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Balance(u128);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u128> for Balance {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} planck", self.0)
    }
}
