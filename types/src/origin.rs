//! Governance origins (OpenGov tracks).
//!
//! The set of origins is fixed by the runtime of each network, so it is a
//! closed enum rather than a free-form string.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The track a referendum was submitted under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Origin {
    Root,
    WhitelistedCaller,
    WishForChange,
    StakingAdmin,
    Treasurer,
    LeaseAdmin,
    FellowshipAdmin,
    GeneralAdmin,
    AuctionAdmin,
    ReferendumCanceller,
    ReferendumKiller,
    SmallTipper,
    BigTipper,
    SmallSpender,
    MediumSpender,
    BigSpender,
}

impl Origin {
    /// Every origin, in track-id order.
    pub const ALL: [Origin; 16] = [
        Self::Root,
        Self::WhitelistedCaller,
        Self::WishForChange,
        Self::StakingAdmin,
        Self::Treasurer,
        Self::LeaseAdmin,
        Self::FellowshipAdmin,
        Self::GeneralAdmin,
        Self::AuctionAdmin,
        Self::ReferendumCanceller,
        Self::ReferendumKiller,
        Self::SmallTipper,
        Self::BigTipper,
        Self::SmallSpender,
        Self::MediumSpender,
        Self::BigSpender,
    ];

    /// Name as it appears in the runtime metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::WhitelistedCaller => "WhitelistedCaller",
            Self::WishForChange => "WishForChange",
            Self::StakingAdmin => "StakingAdmin",
            Self::Treasurer => "Treasurer",
            Self::LeaseAdmin => "LeaseAdmin",
            Self::FellowshipAdmin => "FellowshipAdmin",
            Self::GeneralAdmin => "GeneralAdmin",
            Self::AuctionAdmin => "AuctionAdmin",
            Self::ReferendumCanceller => "ReferendumCanceller",
            Self::ReferendumKiller => "ReferendumKiller",
            Self::SmallTipper => "SmallTipper",
            Self::BigTipper => "BigTipper",
            Self::SmallSpender => "SmallSpender",
            Self::MediumSpender => "MediumSpender",
            Self::BigSpender => "BigSpender",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypesError::UnknownOrigin(s.to_string()))
    }
}
