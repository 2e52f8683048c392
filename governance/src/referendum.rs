//! Per-referendum record owned by the scheduler.

use crate::error::GovernanceError;
use crate::tally::TallyOutcome;
use govproxy_types::{Decision, Origin, ReferendumIndex, Timestamp};
use serde::{Deserialize, Serialize};

/// Where a referendum sits in the proxy voting lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferendumPhase {
    /// No on-chain vote yet; waiting for the first vote to fall due.
    Tracking,
    /// First vote accepted on-chain; waiting for the revote check.
    FirstVoteCast,
    /// No further action will be taken. Terminal.
    Finalized,
}

/// Why a referendum reached [`ReferendumPhase::Finalized`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizeReason {
    /// A differing second vote was cast.
    RevoteCast,
    /// The revote check matched the first vote; nothing resubmitted.
    RevoteUnchanged,
    /// Discovered after the decision period; one vote was cast.
    Backlog,
    /// The decision period ended with no action pending.
    DecisionPeriodElapsed,
    /// The chain reported the referendum is no longer ongoing.
    Concluded,
}

/// The minimal persisted record for one on-chain referendum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferendumState {
    index: ReferendumIndex,
    origin: Origin,
    introduced_at: Timestamp,
    first_vote_cast: Option<Decision>,
    first_vote_cast_at: Option<Timestamp>,
    /// Tally behind the first vote, kept for the audit trail.
    #[serde(default)]
    first_tally: Option<TallyOutcome>,
    second_vote_cast: Option<Decision>,
    second_vote_cast_at: Option<Timestamp>,
    finalized: bool,
    finalize_reason: Option<FinalizeReason>,
    finalized_at: Option<Timestamp>,
}

impl ReferendumState {
    pub fn new(index: ReferendumIndex, origin: Origin, introduced_at: Timestamp) -> Self {
        Self {
            index,
            origin,
            introduced_at,
            first_vote_cast: None,
            first_vote_cast_at: None,
            first_tally: None,
            second_vote_cast: None,
            second_vote_cast_at: None,
            finalized: false,
            finalize_reason: None,
            finalized_at: None,
        }
    }

    pub fn index(&self) -> ReferendumIndex {
        self.index
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn introduced_at(&self) -> Timestamp {
        self.introduced_at
    }

    pub fn first_vote_cast(&self) -> Option<Decision> {
        self.first_vote_cast
    }

    pub fn first_vote_cast_at(&self) -> Option<Timestamp> {
        self.first_vote_cast_at
    }

    pub fn first_tally(&self) -> Option<&TallyOutcome> {
        self.first_tally.as_ref()
    }

    pub fn second_vote_cast(&self) -> Option<Decision> {
        self.second_vote_cast
    }

    pub fn second_vote_cast_at(&self) -> Option<Timestamp> {
        self.second_vote_cast_at
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn finalize_reason(&self) -> Option<FinalizeReason> {
        self.finalize_reason
    }

    pub fn finalized_at(&self) -> Option<Timestamp> {
        self.finalized_at
    }

    /// The decision currently standing on-chain, if any.
    pub fn standing_vote(&self) -> Option<Decision> {
        self.second_vote_cast.or(self.first_vote_cast)
    }

    pub fn phase(&self) -> ReferendumPhase {
        if self.finalized {
            ReferendumPhase::Finalized
        } else if self.first_vote_cast.is_some() {
            ReferendumPhase::FirstVoteCast
        } else {
            ReferendumPhase::Tracking
        }
    }

    /// Seconds since on-chain submission.
    pub fn age_secs(&self, now: Timestamp) -> u64 {
        self.introduced_at.elapsed_since(now)
    }

    pub(crate) fn record_first_vote(&mut self, decision: Decision, tally: TallyOutcome, now: Timestamp) {
        debug_assert_eq!(self.phase(), ReferendumPhase::Tracking);
        self.first_vote_cast = Some(decision);
        self.first_vote_cast_at = Some(now);
        self.first_tally = Some(tally);
    }

    pub(crate) fn record_second_vote(&mut self, decision: Decision, now: Timestamp) {
        debug_assert_eq!(self.phase(), ReferendumPhase::FirstVoteCast);
        self.second_vote_cast = Some(decision);
        self.second_vote_cast_at = Some(now);
    }

    pub(crate) fn finalize(&mut self, reason: FinalizeReason, now: Timestamp) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        self.finalize_reason = Some(reason);
        self.finalized_at = Some(now);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GovernanceError> {
        serde_json::to_vec_pretty(self).map_err(|e| GovernanceError::Codec(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GovernanceError> {
        serde_json::from_slice(bytes).map_err(|e| GovernanceError::Codec(e.to_string()))
    }
}
