//! Parse errors for the shared vocabulary types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("unknown origin: {0}")]
    UnknownOrigin(String),

    #[error("unknown decision: {0}")]
    UnknownDecision(String),

    #[error("unknown conviction: {0}")]
    UnknownConviction(String),
}
