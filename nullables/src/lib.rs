//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the scheduler (clock, chain, chat, storage) has an
//! implementation here that:
//! - Returns deterministic values
//! - Can be controlled programmatically
//! - Records what was sent to it
//! - Never touches the filesystem or network
//!
//! Usage: swap real adapters for nullables in tests.

pub mod chain;
pub mod chat;
pub mod clock;
pub mod store;

pub use chain::{NullChain, SubmittedVote};
pub use chat::NullChat;
pub use clock::NullClock;
pub use store::NullStore;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock, ignoring poisoning: a panicking test thread must not hide the state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
