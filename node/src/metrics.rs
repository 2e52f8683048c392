//! Prometheus metrics for the voter.
//!
//! [`VoterMetrics`] owns a dedicated [`Registry`]; the daemon encodes it into
//! the Prometheus text exposition format on demand.

use govproxy_governance::{TickOutcome, TickReport};
use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

/// Central collection of all voter-level Prometheus metrics.
pub struct VoterMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Scheduler ticks completed.
    pub ticks: IntCounter,
    /// Votes the chain accepted (first and second).
    pub votes_submitted: IntCounter,
    /// Revotes finalized without resubmission because the decision held.
    pub revotes_suppressed: IntCounter,
    /// Due votes held back by the submission gate.
    pub vetoes: IntCounter,
    /// Due votes the chain did not accept.
    pub submission_failures: IntCounter,
    /// Records updated in memory but not written to the store.
    pub persist_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Referenda currently known to the scheduler.
    pub tracked_referenda: IntGauge,
    /// Referenda in the terminal state.
    pub finalized_referenda: IntGauge,
}

impl VoterMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks = register_int_counter_with_registry!(
            Opts::new("govproxy_ticks_total", "Scheduler ticks completed"),
            registry
        )?;
        let votes_submitted = register_int_counter_with_registry!(
            Opts::new(
                "govproxy_votes_submitted_total",
                "Proxy votes accepted by the chain"
            ),
            registry
        )?;
        let revotes_suppressed = register_int_counter_with_registry!(
            Opts::new(
                "govproxy_revotes_suppressed_total",
                "Revotes skipped because the decision was unchanged"
            ),
            registry
        )?;
        let vetoes = register_int_counter_with_registry!(
            Opts::new("govproxy_vetoes_total", "Due votes vetoed by the submission gate"),
            registry
        )?;
        let submission_failures = register_int_counter_with_registry!(
            Opts::new(
                "govproxy_submission_failures_total",
                "Vote submissions the chain did not accept"
            ),
            registry
        )?;
        let persist_failures = register_int_counter_with_registry!(
            Opts::new(
                "govproxy_persist_failures_total",
                "Referendum records that could not be written"
            ),
            registry
        )?;

        let tracked_referenda = register_int_gauge_with_registry!(
            Opts::new("govproxy_tracked_referenda", "Referenda known to the scheduler"),
            registry
        )?;
        let finalized_referenda = register_int_gauge_with_registry!(
            Opts::new("govproxy_finalized_referenda", "Referenda in the terminal state"),
            registry
        )?;

        Ok(Self {
            registry,
            ticks,
            votes_submitted,
            revotes_suppressed,
            vetoes,
            submission_failures,
            persist_failures,
            tracked_referenda,
            finalized_referenda,
        })
    }

    /// Fold one tick's outcomes into the counters.
    pub fn observe_tick(&self, report: &TickReport) {
        self.ticks.inc();
        for (_, outcome) in &report.outcomes {
            match outcome {
                TickOutcome::VoteCast { .. } => self.votes_submitted.inc(),
                TickOutcome::RevoteSuppressed { .. } => self.revotes_suppressed.inc(),
                TickOutcome::Vetoed { .. } => self.vetoes.inc(),
                TickOutcome::SubmissionFailed { .. } => self.submission_failures.inc(),
                TickOutcome::Waiting | TickOutcome::Finalized(_) | TickOutcome::Skipped(_) => {}
            }
        }
        self.persist_failures
            .inc_by(report.persist_failures.len() as u64);
    }

    pub fn set_referendum_counts(&self, tracked: usize, finalized: usize) {
        self.tracked_referenda.set(tracked as i64);
        self.finalized_referenda.set(finalized as i64);
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
