use crate::collaborator::ChainError;
use govproxy_store::StoreError;
use govproxy_types::{Balance, Origin, ReferendumIndex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("no voting periods configured for origin {0}")]
    UnknownOrigin(Origin),

    #[error("misconfigured periods for {origin}: {reason}")]
    MisconfiguredPolicy { origin: Origin, reason: String },

    #[error("proxy balance {balance} is below the floor of {floor}")]
    InsufficientBalance { balance: Balance, floor: Balance },

    #[error("solo mode is enabled; on-chain votes must be cast manually")]
    ManualModeOnly,

    #[error("vote submission failed: {0}")]
    SubmissionFailure(String),

    #[error("referendum {0} is not tracked or already finalized")]
    NotTracked(ReferendumIndex),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("record codec error: {0}")]
    Codec(String),
}
