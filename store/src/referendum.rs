//! Referendum record storage trait.

use crate::StoreError;
use govproxy_types::ReferendumIndex;

/// Trait for storing per-referendum scheduler records.
///
/// Records are opaque bytes; the scheduler owns their encoding.
pub trait ReferendumStore {
    /// Store (insert or overwrite) the record for a referendum.
    fn put_referendum(&self, index: ReferendumIndex, data: &[u8]) -> Result<(), StoreError>;

    /// Get the record for a referendum.
    fn get_referendum(&self, index: ReferendumIndex) -> Result<Vec<u8>, StoreError>;

    /// List every stored referendum index in ascending order.
    fn list_referenda(&self) -> Result<Vec<ReferendumIndex>, StoreError>;
}
