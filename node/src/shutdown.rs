//! Stop signalling for the voter's long-running tasks.
//!
//! `govproxy run` spawns two tasks: the tick loop in
//! [`VotingService::run`](crate::VotingService::run) and, optionally, the
//! metrics file writer. Both hold a [`StopReceiver`] and leave their loop as
//! soon as a [`StopReason`] arrives, so a tick already in flight finishes and
//! persists before the process exits.

use std::fmt;

use tokio::signal;
use tokio::sync::broadcast;

/// Receiving end handed to each task.
pub type StopReceiver = broadcast::Receiver<StopReason>;

/// Why the voter is stopping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// SIGINT, usually Ctrl-C.
    Interrupt,
    /// SIGTERM from a service manager.
    Terminate,
    /// [`ShutdownController::shutdown`] was called.
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Requested => "requested",
        })
    }
}

/// Fans one stop signal out to the tick loop and the metrics writer.
pub struct ShutdownController {
    tx: broadcast::Sender<StopReason>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> StopReceiver {
        self.tx.subscribe()
    }

    /// Stop every subscribed task. A no-op when nothing is subscribed.
    pub fn shutdown(&self) {
        self.stop(StopReason::Requested);
    }

    fn stop(&self, reason: StopReason) {
        let receivers = self.tx.send(reason).unwrap_or(0);
        tracing::info!(%reason, receivers, "stopping governance proxy voter");
    }

    /// Block until SIGINT or SIGTERM, stop the tasks and return which arrived.
    ///
    /// Where SIGTERM cannot be hooked only SIGINT is awaited.
    pub async fn wait_for_signal(&self) -> StopReason {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable; only SIGINT stops the voter");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let reason = tokio::select! {
            _ = signal::ctrl_c() => StopReason::Interrupt,
            _ = terminate => StopReason::Terminate,
        };
        self.stop(reason);
        reason
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
