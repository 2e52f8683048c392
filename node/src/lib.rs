//! Governance proxy voter service.
//!
//! Wraps the synchronous scheduler from `govproxy-governance` in the pieces
//! a long-running process needs:
//! - TOML configuration and validation
//! - Structured logging
//! - Prometheus metrics
//! - Graceful shutdown
//! - The async tick loop

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod service;
pub mod shutdown;
pub mod tracing_spans;

pub use config::{ProxyConfig, VoterSetup};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::VoterMetrics;
pub use service::{Adapters, VotingService};
pub use shutdown::{ShutdownController, StopReason, StopReceiver};
