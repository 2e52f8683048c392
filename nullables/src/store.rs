//! Nullable store: thread-safe in-memory storage for testing.

use crate::lock;
use govproxy_store::{ReferendumStore, StoreError};
use govproxy_types::ReferendumIndex;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory referendum store.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    records: Mutex<BTreeMap<ReferendumIndex, Vec<u8>>>,
    fail_writes: Mutex<bool>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with a backend error until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }
}

impl ReferendumStore for NullStore {
    fn put_referendum(&self, index: ReferendumIndex, data: &[u8]) -> Result<(), StoreError> {
        if *lock(&self.fail_writes) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        lock(&self.records).insert(index, data.to_vec());
        Ok(())
    }

    fn get_referendum(&self, index: ReferendumIndex) -> Result<Vec<u8>, StoreError> {
        lock(&self.records)
            .get(&index)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("referendum {index}")))
    }

    fn list_referenda(&self) -> Result<Vec<ReferendumIndex>, StoreError> {
        Ok(lock(&self.records).keys().copied().collect())
    }
}
