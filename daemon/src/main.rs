//! govproxy daemon, the entry point for running the governance proxy voter.

mod feed;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use govproxy_governance::{
    Collaborators, GovernanceError, ReferendumState, Scheduler, TickOutcome,
};
use govproxy_node::tracing_spans::restore_span;
use govproxy_node::{Adapters, ProxyConfig, ShutdownController, VoterMetrics, VotingService};
use govproxy_store::JsonFileStore;
use govproxy_types::{ReferendumIndex, SystemClock, Timestamp};
use govproxy_utils::format_duration;
use tracing::Instrument;

use crate::feed::FileBridge;

#[derive(Parser)]
#[command(name = "govproxy", about = "Autonomous governance proxy voter")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GOVPROXY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Network whose period table applies: "kusama" or "polkadot".
    #[arg(long, env = "GOVPROXY_NETWORK", global = true)]
    network: Option<String>,

    /// Directory holding the referendum records.
    #[arg(long, env = "GOVPROXY_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Winning share of aye+nay weight (0 selects 0.66).
    #[arg(long, env = "GOVPROXY_THRESHOLD", global = true)]
    threshold: Option<f64>,

    /// Turnout floor in percent (0 disables).
    #[arg(long, env = "GOVPROXY_MIN_PARTICIPATION", global = true)]
    min_participation: Option<f64>,

    /// Minimum proxy balance in planck before votes are held back.
    #[arg(long, env = "GOVPROXY_BALANCE_FLOOR", global = true)]
    balance_floor: Option<u64>,

    /// Conviction for every proxy vote, e.g. "None", "Locked1x", "2x".
    #[arg(long, env = "GOVPROXY_CONVICTION", global = true)]
    conviction: Option<String>,

    /// Compute and report decisions without submitting them.
    #[arg(long, env = "GOVPROXY_SOLO_MODE", global = true)]
    solo: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GOVPROXY_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GOVPROXY_LOG_FORMAT", global = true)]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct BridgeArgs {
    /// JSON feed written by the chain and chat adapters.
    #[arg(long, default_value = "feed.json", env = "GOVPROXY_FEED")]
    feed: PathBuf,

    /// JSON-lines file accepted votes are appended to.
    #[arg(long, default_value = "outbox.jsonl", env = "GOVPROXY_OUTBOX")]
    outbox: PathBuf,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the tick loop until SIGINT/SIGTERM.
    Run {
        #[command(flatten)]
        bridge: BridgeArgs,

        /// Seconds between ticks.
        #[arg(long, env = "GOVPROXY_TICK_INTERVAL_SECS")]
        tick_interval_secs: Option<u64>,

        /// Write Prometheus metrics to this file after every tick interval.
        #[arg(long, env = "GOVPROXY_METRICS_FILE")]
        metrics_file: Option<PathBuf>,
    },
    /// Run a single tick and print what happened.
    Evaluate {
        #[command(flatten)]
        bridge: BridgeArgs,

        /// Evaluate as of this Unix time instead of now.
        #[arg(long)]
        at: Option<u64>,
    },
    /// Tally and submit a vote for one referendum now, outside the schedule.
    ForceVote {
        #[command(flatten)]
        bridge: BridgeArgs,

        /// Referendum index.
        index: ReferendumIndex,
    },
    /// Print the effective period table.
    Periods,
    /// Print every stored referendum record.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Run {
            bridge,
            tick_interval_secs,
            metrics_file,
        } => {
            if let Some(secs) = tick_interval_secs {
                config.tick_interval_secs = secs;
            }
            govproxy_node::init_logging(config.log_format()?, &config.log_level)?;
            run(config, bridge, metrics_file).await
        }
        Command::Evaluate { bridge, at } => {
            govproxy_node::init_logging(config.log_format()?, &config.log_level)?;
            evaluate(&config, &bridge, at)
        }
        Command::ForceVote { bridge, index } => {
            govproxy_node::init_logging(config.log_format()?, &config.log_level)?;
            force_vote(&config, &bridge, index)
        }
        Command::Periods => {
            govproxy_utils::init_tracing("warn");
            print_periods(&config)
        }
        Command::Status => {
            govproxy_utils::init_tracing("warn");
            print_status(&config)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ProxyConfig> {
    let mut config = match &cli.config {
        Some(path) => ProxyConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProxyConfig::default(),
    };

    if let Some(network) = &cli.network {
        config.network = network.parse()?;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(min) = cli.min_participation {
        config.min_participation = min;
    }
    if let Some(floor) = cli.balance_floor {
        config.balance_floor = floor;
    }
    if let Some(conviction) = &cli.conviction {
        config.conviction = conviction.parse()?;
    }
    if cli.solo {
        config.solo_mode = true;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

async fn run(
    config: ProxyConfig,
    bridge: BridgeArgs,
    metrics_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let setup = config.validate()?;
    let store = JsonFileStore::open(&config.data_dir)
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    let bridge = Arc::new(FileBridge::new(bridge.feed, bridge.outbox));

    tracing::info!(
        network = config.network.as_str(),
        data_dir = %config.data_dir.display(),
        feed = %bridge.feed_path().display(),
        tick_interval_secs = config.tick_interval_secs,
        solo_mode = config.solo_mode,
        "starting governance proxy voter"
    );

    let metrics = Arc::new(VoterMetrics::new()?);
    let service = Arc::new(VotingService::new(
        Scheduler::new(Arc::new(setup.policy), setup.settings, setup.gate),
        Adapters {
            chain: bridge.clone(),
            chat: bridge,
            store: Arc::new(store),
        },
        Arc::new(SystemClock),
        Arc::clone(&metrics),
        config.tick_interval(),
    ));

    let restored = service
        .restore()
        .instrument(restore_span(&config.data_dir.to_string_lossy()))
        .await?;
    tracing::info!(restored, "resuming from stored records");

    let shutdown = ShutdownController::new();
    let mut handles = Vec::new();

    let loop_service = Arc::clone(&service);
    let rx = shutdown.subscribe();
    handles.push(tokio::spawn(async move { loop_service.run(rx).await }));

    if let Some(path) = metrics_file {
        let mut rx = shutdown.subscribe();
        let period = service.tick_interval();
        let metrics = Arc::clone(&metrics);
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
            loop {
                tokio::select! {
                    biased;
                    _ = rx.recv() => break,
                    _ = interval.tick() => write_metrics(&metrics, &path),
                }
            }
            write_metrics(&metrics, &path);
        }));
    }

    let reason = shutdown.wait_for_signal().await;
    for handle in handles {
        handle.await.context("background task panicked")?;
    }
    tracing::info!(%reason, "governance proxy voter stopped");
    Ok(())
}

fn write_metrics(metrics: &VoterMetrics, path: &std::path::Path) {
    let result = metrics
        .encode()
        .map_err(anyhow::Error::from)
        .and_then(|text| std::fs::write(path, text).map_err(anyhow::Error::from));
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "failed to write metrics");
    }
}

fn evaluate(config: &ProxyConfig, bridge: &BridgeArgs, at: Option<u64>) -> anyhow::Result<()> {
    let setup = config.validate()?;
    let store = JsonFileStore::open(&config.data_dir)?;
    let bridge = FileBridge::new(&bridge.feed, &bridge.outbox);
    let mut scheduler = Scheduler::new(Arc::new(setup.policy), setup.settings, setup.gate);
    scheduler.restore(&store)?;

    let now = at.map(Timestamp::new).unwrap_or_else(Timestamp::now);
    let c = Collaborators {
        chain: &bridge,
        chat: &bridge,
        store: &store,
    };
    if let Err(e) = scheduler.ingest(now, c) {
        tracing::warn!(error = %e, "feed unavailable; evaluating stored referenda only");
    }
    let report = scheduler.evaluate_tick(now, c);

    println!("tick at {now}: {} evaluated, {} submitted", report.outcomes.len(), report.submissions());
    for (index, outcome) in &report.outcomes {
        println!("  #{index:<6} {}", describe(outcome));
    }
    for (index, reason) in &report.persist_failures {
        println!("  #{index:<6} NOT PERSISTED: {reason}");
    }
    Ok(())
}

fn force_vote(config: &ProxyConfig, bridge: &BridgeArgs, index: ReferendumIndex) -> anyhow::Result<()> {
    let setup = config.validate()?;
    let store = JsonFileStore::open(&config.data_dir)?;
    let bridge = FileBridge::new(&bridge.feed, &bridge.outbox);
    let mut scheduler = Scheduler::new(Arc::new(setup.policy), setup.settings, setup.gate);
    scheduler.restore(&store)?;

    let now = Timestamp::now();
    let c = Collaborators {
        chain: &bridge,
        chat: &bridge,
        store: &store,
    };
    scheduler.ingest(now, c).context("reading feed")?;
    match scheduler.force_vote(index, now, c) {
        Ok(outcome) => println!("#{index}: {}", describe(&outcome)),
        Err(GovernanceError::SubmissionFailure(reason)) => {
            println!("#{index}: not yet accepted ({reason}); re-run once the signer confirms");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn describe(outcome: &TickOutcome) -> String {
    match outcome {
        TickOutcome::Waiting => "waiting".to_string(),
        TickOutcome::VoteCast { stage, decision } => {
            format!("vote {} cast: {decision}", stage.ordinal())
        }
        TickOutcome::RevoteSuppressed { decision } => {
            format!("revote unchanged ({decision}); finalized")
        }
        TickOutcome::Vetoed { stage, veto } => format!("vote {} vetoed: {veto}", stage.ordinal()),
        TickOutcome::SubmissionFailed { stage, reason } => {
            format!("vote {} failed: {reason}", stage.ordinal())
        }
        TickOutcome::Finalized(reason) => format!("finalized ({reason:?})"),
        TickOutcome::Skipped(reason) => format!("skipped: {reason}"),
    }
}

fn print_periods(config: &ProxyConfig) -> anyhow::Result<()> {
    let setup = config.validate()?;
    println!("{} period table (days since submission)", config.network);
    println!("{:<22} {:>9} {:>11} {:>7}", "origin", "decision", "first vote", "revote");
    for (origin, periods) in setup.policy.iter() {
        println!(
            "{:<22} {:>9} {:>11} {:>7}",
            origin.as_str(),
            periods.decision_period_days,
            periods.internal_vote_period_days,
            periods.revote_period_days
        );
    }
    Ok(())
}

fn print_status(config: &ProxyConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&config.data_dir)?;
    let setup = config.validate()?;
    let mut scheduler = Scheduler::new(Arc::new(setup.policy), setup.settings, setup.gate);
    scheduler.restore(&store)?;

    let now = Timestamp::now();
    println!(
        "{} referenda in {} ({} pending)",
        scheduler.len(),
        config.data_dir.display(),
        scheduler.pending_count()
    );
    for state in scheduler.referenda() {
        println!("  {}", status_line(state, now));
    }
    Ok(())
}

fn status_line(state: &ReferendumState, now: Timestamp) -> String {
    let vote = |d: Option<govproxy_types::Decision>| d.map_or("-".to_string(), |d| d.to_string());
    let reason = state
        .finalize_reason()
        .map_or(String::new(), |r| format!(" ({r:?})"));
    format!(
        "#{:<6} {:<20} age {:<12} first {:<8} second {:<8} {:?}{}",
        state.index(),
        state.origin().as_str(),
        format_duration(state.age_secs(now)),
        vote(state.first_vote_cast()),
        vote(state.second_vote_cast()),
        state.phase(),
        reason
    )
}
