//! Pre-built [`tracing::Span`] constructors for the voter's recurring work.
//!
//! Consistent span names and fields make it easy to filter one tick, or one
//! referendum across many ticks, in the JSON log output.

use govproxy_types::{Origin, ReferendumIndex, Timestamp};
use tracing::{info_span, Span};

/// Span covering one full scheduler tick (ingest + evaluation).
pub fn tick_span(tick: u64, now: Timestamp) -> Span {
    info_span!("tick", tick, now = now.as_secs())
}

/// Span covering work on a single referendum outside the tick loop.
pub fn referendum_span(index: ReferendumIndex, origin: Origin) -> Span {
    info_span!("referendum", index, origin = %origin)
}

/// Span covering the restore of persisted records at startup.
pub fn restore_span(data_dir: &str) -> Span {
    info_span!("restore", data_dir = %data_dir)
}
