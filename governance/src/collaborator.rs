//! Boundaries to the chain and chat adapters.
//!
//! The scheduler never talks to a node or a chat platform directly. It pulls
//! events and ballots through these traits and pushes vote commands and
//! notifications back out. Implementations live outside this crate (real
//! adapters) or in the nullables crate (tests).

use crate::tally::{RawVote, TallyOutcome};
use govproxy_types::{Balance, Conviction, Decision, Origin, ReferendumIndex, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain unavailable: {0}")]
    Unavailable(String),

    #[error("extrinsic rejected: {0}")]
    Rejected(String),

    #[error("request timed out")]
    Timeout,
}

/// A referendum newly observed on-chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReferendum {
    pub index: ReferendumIndex,
    pub origin: Origin,
    /// When the referendum was submitted on-chain.
    pub introduced_at: Timestamp,
}

/// Which of the two possible proxy votes an action concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteStage {
    First,
    Second,
}

impl VoteStage {
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

/// Events pushed to the chat collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// A due vote was evaluated (whether or not it was submitted).
    Evaluation {
        index: ReferendumIndex,
        stage: VoteStage,
        tally: TallyOutcome,
    },
    /// The chain accepted a proxy vote.
    VoteCast {
        index: ReferendumIndex,
        stage: VoteStage,
        decision: Decision,
        conviction: Conviction,
    },
    /// An operator forced a vote outside the schedule.
    ForcedVote {
        index: ReferendumIndex,
        decision: Decision,
        conviction: Conviction,
        tally: TallyOutcome,
    },
    /// The revote check matched the first vote; nothing was resubmitted.
    RevoteUnchanged {
        index: ReferendumIndex,
        decision: Decision,
    },
    /// The proxy balance fell below the floor. Sent once per crossing.
    BalanceAlert { balance: Balance, floor: Balance },
    /// Turnout is below the floor shortly before the first vote falls due.
    ParticipationWarning {
        index: ReferendumIndex,
        votes_cast: f64,
        eligible: u32,
        min_required_voters: u32,
        secs_remaining: u64,
    },
}

/// The blockchain side: referendum discovery, balance, vote submission.
pub trait ChainClient {
    /// Referenda submitted since the last call.
    fn new_referendum_events(&self) -> Result<Vec<NewReferendum>, ChainError>;

    /// Referenda that are no longer ongoing on-chain.
    fn concluded_referenda(&self) -> Result<Vec<ReferendumIndex>, ChainError>;

    /// Free balance of the proxied account.
    fn proxy_balance(&self) -> Result<Balance, ChainError>;

    /// Cast a vote through the proxy. `Ok` means the network accepted it.
    fn submit_vote(
        &self,
        index: ReferendumIndex,
        decision: Decision,
        conviction: Conviction,
    ) -> Result<(), ChainError>;
}

/// The community side: ballots, electorate size, notifications.
pub trait ChatClient {
    /// Current internal ballots for a referendum.
    fn votes(&self, index: ReferendumIndex) -> Vec<RawVote>;

    /// Members holding the voter role (all members when `role_filter` is `None`).
    fn eligible_voter_count(&self, role_filter: Option<&str>) -> u32;

    fn notify(&self, notification: Notification);
}
