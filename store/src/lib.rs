//! Abstract storage for referendum records.
//!
//! The scheduler persists one opaque record per referendum index through the
//! [`ReferendumStore`] trait. [`JsonFileStore`] is the on-disk backend; tests
//! use the in-memory store from the nullables crate.

pub mod error;
pub mod file;
pub mod referendum;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use referendum::ReferendumStore;
