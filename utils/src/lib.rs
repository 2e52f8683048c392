//! Shared utilities for the governance proxy voter.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::format_duration;
