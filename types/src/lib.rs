//! Fundamental types for the governance proxy voter.
//!
//! This crate defines the vocabulary shared across every other crate in the
//! workspace: timestamps, networks, governance origins, decisions, conviction
//! and balances.

pub mod balance;
pub mod conviction;
pub mod decision;
pub mod error;
pub mod network;
pub mod origin;
pub mod time;

pub use balance::Balance;
pub use conviction::Conviction;
pub use decision::{Decision, VoteChoice};
pub use error::TypesError;
pub use network::NetworkId;
pub use origin::Origin;
pub use time::{Clock, SystemClock, Timestamp};

/// On-chain referendum index. Unique per network.
pub type ReferendumIndex = u32;
