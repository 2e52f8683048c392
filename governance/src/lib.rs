//! Autonomous proxy voting on OpenGov referenda.
//!
//! Each tracked referendum moves through a small state machine:
//! Tracking → FirstVoteCast → Finalized. On every tick the [`Scheduler`]
//! compares a referendum's age against its origin's [`PeriodSet`], tallies
//! the internal ballots with [`VoteTally`], runs the [`SubmissionGate`]
//! safety checks and asks the chain collaborator to cast the proxy vote.
//!
//! Key principle: only a vote the chain accepted advances the state machine.
//! Everything else (vetoes, failed submissions) is retried on the next tick.

pub mod collaborator;
pub mod error;
pub mod gate;
pub mod period;
pub mod referendum;
pub mod scheduler;
pub mod tally;

pub use collaborator::{ChainClient, ChainError, ChatClient, NewReferendum, Notification, VoteStage};
pub use error::GovernanceError;
pub use gate::{AuthorizedDecision, SubmissionGate, Veto};
pub use period::{PeriodPolicy, PeriodSet};
pub use referendum::{FinalizeReason, ReferendumPhase, ReferendumState};
pub use scheduler::{Collaborators, Scheduler, TickOutcome, TickReport, VotingSettings};
pub use tally::{ParticipationReport, RawVote, TallyOutcome, VoteTally, DEFAULT_THRESHOLD};
