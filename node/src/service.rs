//! Async driver for the scheduler.
//!
//! The scheduler is synchronous. [`VotingService`] owns it behind a
//! `tokio::sync::Mutex` so that at most one tick evaluates at a time, and
//! calls it on a fixed cadence until shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use govproxy_governance::{
    ChainClient, ChatClient, Collaborators, ReferendumState, Scheduler, TickOutcome, TickReport,
};
use govproxy_store::ReferendumStore;
use govproxy_types::Clock;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::metrics::VoterMetrics;
use crate::shutdown::StopReceiver;
use crate::tracing_spans::{referendum_span, tick_span};
use crate::NodeError;

/// Shared handles to the external adapters.
#[derive(Clone)]
pub struct Adapters {
    pub chain: Arc<dyn ChainClient + Send + Sync>,
    pub chat: Arc<dyn ChatClient + Send + Sync>,
    pub store: Arc<dyn ReferendumStore + Send + Sync>,
}

impl Adapters {
    fn borrow(&self) -> Collaborators<'_> {
        Collaborators {
            chain: &*self.chain,
            chat: &*self.chat,
            store: &*self.store,
        }
    }
}

/// Periodically ingests chain events and evaluates every referendum.
pub struct VotingService {
    scheduler: Mutex<Scheduler>,
    adapters: Adapters,
    clock: Arc<dyn Clock>,
    metrics: Arc<VoterMetrics>,
    tick_interval: Duration,
    ticks: AtomicU64,
}

impl VotingService {
    pub fn new(
        scheduler: Scheduler,
        adapters: Adapters,
        clock: Arc<dyn Clock>,
        metrics: Arc<VoterMetrics>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            scheduler: Mutex::new(scheduler),
            adapters,
            clock,
            metrics,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn metrics(&self) -> &VoterMetrics {
        &self.metrics
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Load persisted records into the scheduler.
    pub async fn restore(&self) -> Result<usize, NodeError> {
        let mut scheduler = self.scheduler.lock().await;
        let restored = scheduler.restore(&*self.adapters.store)?;
        self.metrics
            .set_referendum_counts(scheduler.len(), scheduler.len() - scheduler.pending_count());
        Ok(restored)
    }

    /// One full tick: pull chain events, then evaluate every referendum.
    ///
    /// A failing event feed is logged; evaluation of already tracked
    /// referenda still runs.
    pub async fn run_once(&self) -> TickReport {
        let mut scheduler = self.scheduler.lock().await;
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let now = self.clock.now();
        let span = tick_span(tick, now);
        let _enter = span.enter();

        let collaborators = self.adapters.borrow();
        match scheduler.ingest(now, collaborators) {
            Ok((0, 0)) => {}
            Ok((tracked, concluded)) => {
                tracing::info!(tracked, concluded, "ingested chain events");
            }
            Err(e) => tracing::warn!(error = %e, "chain event feed failed; evaluating known referenda"),
        }

        let report = scheduler.evaluate_tick(now, collaborators);
        for (index, outcome) in &report.outcomes {
            if let TickOutcome::Skipped(reason) = outcome {
                if let Some(state) = scheduler.get(*index) {
                    let _ref = referendum_span(*index, state.origin()).entered();
                    tracing::error!(%reason, "referendum cannot be evaluated");
                }
            }
        }

        self.metrics.observe_tick(&report);
        self.metrics
            .set_referendum_counts(scheduler.len(), scheduler.len() - scheduler.pending_count());
        report
    }

    /// Tick on the configured cadence until `shutdown_rx` fires.
    pub async fn run(&self, mut shutdown_rx: StopReceiver) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.tick_interval.as_secs(), "voting service started");
        loop {
            tokio::select! {
                biased;
                reason = shutdown_rx.recv() => {
                    let reason = reason.map_or_else(|_| "channel closed".to_string(), |r| r.to_string());
                    tracing::info!(%reason, "voting service shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.run_once().await;
                    if report.submissions() > 0 {
                        tracing::info!(submissions = report.submissions(), "tick submitted votes");
                    }
                }
            }
        }
    }

    /// Copy of every record, ordered by index.
    pub async fn snapshot(&self) -> Vec<ReferendumState> {
        self.scheduler.lock().await.referenda().cloned().collect()
    }
}
