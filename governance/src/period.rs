//! Per-origin voting periods.
//!
//! Every origin maps to three whole-day offsets from the moment a referendum
//! was submitted on-chain: when the first proxy vote is cast, when the revote
//! check runs, and when the decision period ends. The table is built once at
//! startup and only read afterwards.

use crate::error::GovernanceError;
use govproxy_types::{NetworkId, Origin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timing for one origin, in days since on-chain submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSet {
    pub decision_period_days: u32,
    pub internal_vote_period_days: u32,
    pub revote_period_days: u32,
}

impl PeriodSet {
    pub const fn new(decision: u32, internal_vote: u32, revote: u32) -> Self {
        Self {
            decision_period_days: decision,
            internal_vote_period_days: internal_vote,
            revote_period_days: revote,
        }
    }

    /// Check `internal_vote < revote <= decision`.
    pub fn validate(&self, origin: Origin) -> Result<(), GovernanceError> {
        let misconfigured = |reason: String| GovernanceError::MisconfiguredPolicy { origin, reason };
        if self.internal_vote_period_days >= self.revote_period_days {
            return Err(misconfigured(format!(
                "internal vote period ({}d) must be shorter than the revote period ({}d)",
                self.internal_vote_period_days, self.revote_period_days
            )));
        }
        if self.revote_period_days > self.decision_period_days {
            return Err(misconfigured(format!(
                "revote period ({}d) exceeds the decision period ({}d)",
                self.revote_period_days, self.decision_period_days
            )));
        }
        Ok(())
    }
}

const SHORT: PeriodSet = PeriodSet::new(7, 1, 4);
const KUSAMA_STANDARD: PeriodSet = PeriodSet::new(14, 3, 10);
const POLKADOT_STANDARD: PeriodSet = PeriodSet::new(28, 7, 21);

/// Immutable origin → [`PeriodSet`] table.
#[derive(Clone, Debug)]
pub struct PeriodPolicy {
    table: BTreeMap<Origin, PeriodSet>,
}

impl PeriodPolicy {
    /// Build a policy from an explicit table, validating every entry.
    pub fn new(table: BTreeMap<Origin, PeriodSet>) -> Result<Self, GovernanceError> {
        for (origin, periods) in &table {
            periods.validate(*origin)?;
        }
        Ok(Self { table })
    }

    /// Built-in table for a network.
    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Kusama => Self::kusama(),
            NetworkId::Polkadot => Self::polkadot(),
        }
    }

    /// Kusama: 14-day decision periods, 7 days for tippers and the canceller.
    pub fn kusama() -> Self {
        Self::standard(KUSAMA_STANDARD)
    }

    /// Polkadot: 28-day decision periods, 7 days for tippers and the canceller.
    pub fn polkadot() -> Self {
        Self::standard(POLKADOT_STANDARD)
    }

    fn standard(standard: PeriodSet) -> Self {
        let table = Origin::ALL
            .iter()
            .map(|&origin| {
                let periods = match origin {
                    Origin::ReferendumCanceller | Origin::SmallTipper | Origin::BigTipper => SHORT,
                    _ => standard,
                };
                (origin, periods)
            })
            .collect();
        Self { table }
    }

    /// Replace individual entries, re-validating the result.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<Origin, PeriodSet>,
    ) -> Result<Self, GovernanceError> {
        for (origin, periods) in overrides {
            periods.validate(*origin)?;
            self.table.insert(*origin, *periods);
        }
        Ok(self)
    }

    /// Periods for `origin`. Never falls back to a default schedule.
    pub fn lookup(&self, origin: Origin) -> Result<PeriodSet, GovernanceError> {
        self.table
            .get(&origin)
            .copied()
            .ok_or(GovernanceError::UnknownOrigin(origin))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Origin, PeriodSet)> + '_ {
        self.table.iter().map(|(o, p)| (*o, *p))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
