//! Nullable chain: scripted referendum events and a recording vote sink.

use crate::lock;
use govproxy_governance::{ChainClient, ChainError, NewReferendum};
use govproxy_types::{Balance, Conviction, Decision, ReferendumIndex};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A vote the chain accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmittedVote {
    pub index: ReferendumIndex,
    pub decision: Decision,
    pub conviction: Conviction,
}

/// An in-memory chain for testing.
///
/// New-referendum and concluded events are drained on read, like a
/// subscription. Submissions are recorded unless a failure is queued.
pub struct NullChain {
    balance: Mutex<Balance>,
    new_events: Mutex<Vec<NewReferendum>>,
    concluded: Mutex<Vec<ReferendumIndex>>,
    submitted: Mutex<Vec<SubmittedVote>>,
    submit_failures: Mutex<VecDeque<ChainError>>,
    balance_unavailable: Mutex<bool>,
}

impl NullChain {
    pub fn new(balance: Balance) -> Self {
        Self {
            balance: Mutex::new(balance),
            new_events: Mutex::new(Vec::new()),
            concluded: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            submit_failures: Mutex::new(VecDeque::new()),
            balance_unavailable: Mutex::new(false),
        }
    }

    pub fn set_balance(&self, balance: Balance) {
        *lock(&self.balance) = balance;
    }

    /// Make `proxy_balance` fail until cleared.
    pub fn set_balance_unavailable(&self, unavailable: bool) {
        *lock(&self.balance_unavailable) = unavailable;
    }

    pub fn push_referendum(&self, event: NewReferendum) {
        lock(&self.new_events).push(event);
    }

    pub fn push_concluded(&self, index: ReferendumIndex) {
        lock(&self.concluded).push(index);
    }

    /// Reject the next submission with `error`.
    pub fn fail_next_submission(&self, error: ChainError) {
        lock(&self.submit_failures).push_back(error);
    }

    pub fn submitted(&self) -> Vec<SubmittedVote> {
        lock(&self.submitted).clone()
    }

    pub fn submissions_for(&self, index: ReferendumIndex) -> Vec<SubmittedVote> {
        lock(&self.submitted)
            .iter()
            .filter(|v| v.index == index)
            .copied()
            .collect()
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new(Balance::ZERO)
    }
}

impl ChainClient for NullChain {
    fn new_referendum_events(&self) -> Result<Vec<NewReferendum>, ChainError> {
        Ok(std::mem::take(&mut *lock(&self.new_events)))
    }

    fn concluded_referenda(&self) -> Result<Vec<ReferendumIndex>, ChainError> {
        Ok(std::mem::take(&mut *lock(&self.concluded)))
    }

    fn proxy_balance(&self) -> Result<Balance, ChainError> {
        if *lock(&self.balance_unavailable) {
            return Err(ChainError::Unavailable("balance query disabled".into()));
        }
        Ok(*lock(&self.balance))
    }

    fn submit_vote(
        &self,
        index: ReferendumIndex,
        decision: Decision,
        conviction: Conviction,
    ) -> Result<(), ChainError> {
        if let Some(error) = lock(&self.submit_failures).pop_front() {
            return Err(error);
        }
        lock(&self.submitted).push(SubmittedVote {
            index,
            decision,
            conviction,
        });
        Ok(())
    }
}
