//! Nullable chat: settable ballots and a notification recorder.

use crate::lock;
use govproxy_governance::{ChatClient, Notification, RawVote};
use govproxy_types::{ReferendumIndex, VoteChoice};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory chat platform for testing.
pub struct NullChat {
    ballots: Mutex<HashMap<ReferendumIndex, Vec<RawVote>>>,
    eligible: Mutex<u32>,
    notifications: Mutex<Vec<Notification>>,
}

impl NullChat {
    pub fn new(eligible: u32) -> Self {
        Self {
            ballots: Mutex::new(HashMap::new()),
            eligible: Mutex::new(eligible),
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn set_eligible(&self, eligible: u32) {
        *lock(&self.eligible) = eligible;
    }

    pub fn set_votes(&self, index: ReferendumIndex, votes: Vec<RawVote>) {
        lock(&self.ballots).insert(index, votes);
    }

    /// Replace the ballots with `aye`/`nay`/`recuse` unit-weight votes.
    pub fn set_counts(&self, index: ReferendumIndex, aye: usize, nay: usize, recuse: usize) {
        let mut votes = Vec::with_capacity(aye + nay + recuse);
        votes.extend((0..aye).map(|i| RawVote::new(format!("aye-{i}"), VoteChoice::Aye)));
        votes.extend((0..nay).map(|i| RawVote::new(format!("nay-{i}"), VoteChoice::Nay)));
        votes.extend((0..recuse).map(|i| RawVote::new(format!("recuse-{i}"), VoteChoice::Recuse)));
        self.set_votes(index, votes);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    pub fn clear_notifications(&self) {
        lock(&self.notifications).clear();
    }
}

impl Default for NullChat {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ChatClient for NullChat {
    fn votes(&self, index: ReferendumIndex) -> Vec<RawVote> {
        lock(&self.ballots).get(&index).cloned().unwrap_or_default()
    }

    fn eligible_voter_count(&self, _role_filter: Option<&str>) -> u32 {
        *lock(&self.eligible)
    }

    fn notify(&self, notification: Notification) {
        lock(&self.notifications).push(notification);
    }
}
