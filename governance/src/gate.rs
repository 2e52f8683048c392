//! Pre-submission safety checks.

use crate::error::GovernanceError;
use govproxy_types::{Balance, Conviction, Decision};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a due vote was not submitted this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Veto {
    /// The proxy cannot afford the transaction fee safely.
    InsufficientBalance { balance: Balance, floor: Balance },
    /// Solo mode: decisions are reported but never submitted automatically.
    ManualModeOnly,
}

impl fmt::Display for Veto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientBalance { balance, floor } => {
                write!(f, "insufficient balance ({balance} < {floor})")
            }
            Self::ManualModeOnly => f.write_str("manual mode only"),
        }
    }
}

impl From<Veto> for GovernanceError {
    fn from(veto: Veto) -> Self {
        match veto {
            Veto::InsufficientBalance { balance, floor } => {
                GovernanceError::InsufficientBalance { balance, floor }
            }
            Veto::ManualModeOnly => GovernanceError::ManualModeOnly,
        }
    }
}

/// A decision cleared for submission, tagged with the network conviction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuthorizedDecision {
    pub decision: Decision,
    pub conviction: Conviction,
    pub participation: f64,
}

/// Vetoes submissions while the proxy balance is below the floor or solo
/// mode is on. Never alters the decision itself.
#[derive(Clone, Debug)]
pub struct SubmissionGate {
    balance_floor: Balance,
    conviction: Conviction,
    solo_mode: bool,
}

impl SubmissionGate {
    pub fn new(balance_floor: Balance, conviction: Conviction, solo_mode: bool) -> Self {
        Self {
            balance_floor,
            conviction,
            solo_mode,
        }
    }

    pub fn balance_floor(&self) -> Balance {
        self.balance_floor
    }

    pub fn conviction(&self) -> Conviction {
        self.conviction
    }

    /// Whether every submission will be vetoed regardless of balance.
    pub fn is_manual_only(&self) -> bool {
        self.solo_mode
    }

    pub fn authorize(
        &self,
        decision: Decision,
        participation: f64,
        proxy_balance: Balance,
    ) -> Result<AuthorizedDecision, Veto> {
        if self.solo_mode {
            return Err(Veto::ManualModeOnly);
        }
        if proxy_balance < self.balance_floor {
            return Err(Veto::InsufficientBalance {
                balance: proxy_balance,
                floor: self.balance_floor,
            });
        }
        Ok(AuthorizedDecision {
            decision,
            conviction: self.conviction,
            participation,
        })
    }
}
