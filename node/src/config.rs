//! Voter configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use govproxy_governance::{PeriodPolicy, PeriodSet, SubmissionGate, VotingSettings, DEFAULT_THRESHOLD};
use govproxy_types::time::SECS_PER_DAY;
use govproxy_types::{Balance, Conviction, NetworkId, Origin};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for the proxy voter.
///
/// Can be loaded from a TOML file via [`ProxyConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Which network's period table to start from.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Directory holding one JSON record per referendum.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Seconds between scheduler ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Winning share of aye+nay weight, in `(0, 1]`. `0` selects 0.66.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Turnout floor in percent of eligible voters. `0` disables it.
    #[serde(default)]
    pub min_participation: f64,

    /// Votes are held back while the proxy balance is below this (planck).
    #[serde(default)]
    pub balance_floor: u64,

    /// Conviction attached to every proxy vote.
    #[serde(default)]
    pub conviction: Conviction,

    /// Compute and report decisions, but never submit them.
    #[serde(default)]
    pub solo_mode: bool,

    /// Chat role whose members form the electorate. All members when unset.
    #[serde(default)]
    pub voter_role: Option<String>,

    /// Warn about low turnout when the first vote is this close.
    #[serde(default = "default_participation_warning_secs")]
    pub participation_warning_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-origin overrides of the built-in period table, keyed by origin name.
    #[serde(default)]
    pub periods: BTreeMap<String, PeriodSet>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Kusama
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./govproxy_data")
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_participation_warning_secs() -> u64 {
    SECS_PER_DAY
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Everything the scheduler needs, checked and built from a [`ProxyConfig`].
#[derive(Clone, Debug)]
pub struct VoterSetup {
    pub policy: PeriodPolicy,
    pub settings: VotingSettings,
    pub gate: SubmissionGate,
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ProxyConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Reject out-of-range values and build the period policy.
    ///
    /// A bad period override surfaces here as a
    /// [`GovernanceError::MisconfiguredPolicy`](govproxy_governance::GovernanceError)
    /// rather than at the first tick.
    pub fn validate(&self) -> Result<VoterSetup, NodeError> {
        if self.tick_interval_secs == 0 {
            return Err(NodeError::Config("tick_interval_secs must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(NodeError::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.min_participation) {
            return Err(NodeError::Config(format!(
                "min_participation must be a percentage within [0, 100], got {}",
                self.min_participation
            )));
        }
        self.log_format()?;

        let mut overrides = BTreeMap::new();
        for (name, periods) in &self.periods {
            let origin: Origin = name
                .parse()
                .map_err(|e| NodeError::Config(format!("[periods.{name}]: {e}")))?;
            overrides.insert(origin, *periods);
        }
        let policy = PeriodPolicy::for_network(self.network).with_overrides(&overrides)?;

        let settings = VotingSettings {
            threshold: self.threshold,
            min_participation: self.min_participation,
            voter_role: self.voter_role.clone().filter(|r| !r.is_empty()),
            participation_warning_secs: self.participation_warning_secs,
        };
        let gate = SubmissionGate::new(
            Balance::new(u128::from(self.balance_floor)),
            self.conviction,
            self.solo_mode,
        );
        Ok(VoterSetup {
            policy,
            settings,
            gate,
        })
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            tick_interval_secs: default_tick_interval_secs(),
            threshold: default_threshold(),
            min_participation: 0.0,
            balance_floor: 0,
            conviction: Conviction::default(),
            solo_mode: false,
            voter_role: None,
            participation_warning_secs: default_participation_warning_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            periods: BTreeMap::new(),
        }
    }
}
