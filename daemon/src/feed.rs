//! File bridge to the external chain and chat adapters.
//!
//! The adapters that talk to a Substrate node and to the chat platform run
//! as separate processes. They publish what they observe into a JSON *feed*
//! file and consume accepted votes from a JSON-lines *outbox*:
//!
//! ```json
//! {
//!   "proxy_balance": 25000000000000,
//!   "eligible_voters": 40,
//!   "referenda": [{ "index": 412, "origin": "SmallTipper", "introduced_at": 1700000000 }],
//!   "concluded": [398],
//!   "ballots": { "412": [{ "voter_id": "alice", "choice": "aye" }] },
//!   "accepted": [{ "index": 398, "decision": "aye" }]
//! }
//! ```
//!
//! The feed is re-read whenever the scheduler asks for new referenda, i.e.
//! once per tick, and before every submission. A submission appends a
//! command to the outbox unless the same vote is already queued, and only
//! succeeds once the signer lists that vote under `accepted`. Until then it
//! times out and the scheduler retries on the next tick.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use govproxy_governance::{ChainClient, ChainError, ChatClient, NewReferendum, Notification, RawVote};
use govproxy_types::{Balance, Conviction, Decision, ReferendumIndex, Timestamp};
use serde::{Deserialize, Serialize};

/// Snapshot published by the external adapters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub proxy_balance: Balance,
    #[serde(default)]
    pub eligible_voters: u32,
    /// Role-specific electorate sizes; falls back to `eligible_voters`.
    #[serde(default)]
    pub eligible_by_role: HashMap<String, u32>,
    #[serde(default)]
    pub referenda: Vec<NewReferendum>,
    #[serde(default)]
    pub concluded: Vec<ReferendumIndex>,
    #[serde(default)]
    pub ballots: HashMap<ReferendumIndex, Vec<RawVote>>,
    /// Votes the signer has seen included on-chain.
    #[serde(default)]
    pub accepted: Vec<AcceptedVote>,
}

impl Feed {
    fn is_accepted(&self, index: ReferendumIndex, decision: Decision) -> bool {
        self.accepted
            .iter()
            .any(|v| v.index == index && v.decision == decision)
    }
}

/// Confirmation written back by the signer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedVote {
    pub index: ReferendumIndex,
    pub decision: Decision,
}

/// One line of the outbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteCommand {
    pub index: ReferendumIndex,
    pub decision: Decision,
    pub conviction: Conviction,
    pub queued_at: Timestamp,
}

/// [`ChainClient`] and [`ChatClient`] backed by the feed and outbox files.
pub struct FileBridge {
    feed_path: PathBuf,
    outbox_path: PathBuf,
    feed: Mutex<Feed>,
}

impl FileBridge {
    pub fn new(feed_path: impl Into<PathBuf>, outbox_path: impl Into<PathBuf>) -> Self {
        Self {
            feed_path: feed_path.into(),
            outbox_path: outbox_path.into(),
            feed: Mutex::new(Feed::default()),
        }
    }

    pub fn feed_path(&self) -> &Path {
        &self.feed_path
    }

    /// Re-read the feed file into the cached snapshot.
    pub fn refresh(&self) -> Result<(), ChainError> {
        let bytes = fs::read(&self.feed_path)
            .map_err(|e| ChainError::Unavailable(format!("{}: {e}", self.feed_path.display())))?;
        let feed: Feed = serde_json::from_slice(&bytes)
            .map_err(|e| ChainError::Unavailable(format!("malformed feed: {e}")))?;
        *self.snapshot() = feed;
        Ok(())
    }

    fn snapshot(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the outbox already holds a command for this vote.
    fn is_queued(&self, index: ReferendumIndex, decision: Decision) -> std::io::Result<bool> {
        let text = match fs::read_to_string(&self.outbox_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(text
            .lines()
            .filter_map(|line| serde_json::from_str::<VoteCommand>(line).ok())
            .any(|c| c.index == index && c.decision == decision))
    }

    fn append_command(&self, command: &VoteCommand) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(command)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox_path)?;
        file.write_all(&line)?;
        file.sync_data()
    }
}

impl ChainClient for FileBridge {
    fn new_referendum_events(&self) -> Result<Vec<NewReferendum>, ChainError> {
        self.refresh()?;
        Ok(self.snapshot().referenda.clone())
    }

    fn concluded_referenda(&self) -> Result<Vec<ReferendumIndex>, ChainError> {
        Ok(self.snapshot().concluded.clone())
    }

    fn proxy_balance(&self) -> Result<Balance, ChainError> {
        Ok(self.snapshot().proxy_balance)
    }

    fn submit_vote(
        &self,
        index: ReferendumIndex,
        decision: Decision,
        conviction: Conviction,
    ) -> Result<(), ChainError> {
        self.refresh()?;
        if self.snapshot().is_accepted(index, decision) {
            tracing::info!(index, %decision, "vote confirmed by signer");
            return Ok(());
        }

        let outbox_error =
            |e: std::io::Error| ChainError::Rejected(format!("outbox {}: {e}", self.outbox_path.display()));
        if !self.is_queued(index, decision).map_err(outbox_error)? {
            let command = VoteCommand {
                index,
                decision,
                conviction,
                queued_at: Timestamp::now(),
            };
            self.append_command(&command).map_err(outbox_error)?;
            tracing::info!(index, %decision, %conviction, "vote queued for signing");
        } else {
            tracing::debug!(index, %decision, "vote still awaiting signer confirmation");
        }
        Err(ChainError::Timeout)
    }
}

impl ChatClient for FileBridge {
    fn votes(&self, index: ReferendumIndex) -> Vec<RawVote> {
        self.snapshot().ballots.get(&index).cloned().unwrap_or_default()
    }

    fn eligible_voter_count(&self, role_filter: Option<&str>) -> u32 {
        let feed = self.snapshot();
        role_filter
            .and_then(|role| feed.eligible_by_role.get(role).copied())
            .unwrap_or(feed.eligible_voters)
    }

    fn notify(&self, notification: Notification) {
        match serde_json::to_string(&notification) {
            Ok(json) => tracing::info!(notification = %json, "notification"),
            Err(e) => tracing::warn!(error = %e, "unserializable notification"),
        }
    }
}
