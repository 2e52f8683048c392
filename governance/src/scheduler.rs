//! Tick-driven proxy voting scheduler.
//!
//! The scheduler owns no timers. Each call to [`Scheduler::evaluate_tick`]
//! re-derives what is due from `(now, stored state)`, so a restarted process
//! resumes simply by restoring its records and ticking again.
//!
//! Per referendum, evaluation is strictly sequential:
//! tally → gate → submit → persist. Only a submission the chain accepted
//! advances the state; vetoes and failures leave it untouched for retry.

use crate::collaborator::{ChainClient, ChatClient, NewReferendum, Notification, VoteStage};
use crate::error::GovernanceError;
use crate::gate::{SubmissionGate, Veto};
use crate::period::{PeriodPolicy, PeriodSet};
use crate::referendum::{FinalizeReason, ReferendumPhase, ReferendumState};
use crate::tally::{RawVote, TallyOutcome, VoteTally};
use govproxy_store::{ReferendumStore, StoreError};
use govproxy_types::time::SECS_PER_DAY;
use govproxy_types::{Decision, ReferendumIndex, Timestamp};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Tally and notification settings.
#[derive(Clone, Debug, PartialEq)]
pub struct VotingSettings {
    /// Winning share in `(0, 1]`; `0` selects the 0.66 default.
    pub threshold: f64,
    /// Turnout floor in percent; `0` disables it.
    pub min_participation: f64,
    /// Role whose members form the electorate.
    pub voter_role: Option<String>,
    /// How long before the first vote a low-turnout warning may be sent.
    pub participation_warning_secs: u64,
}

impl Default for VotingSettings {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            min_participation: 0.0,
            voter_role: None,
            participation_warning_secs: SECS_PER_DAY,
        }
    }
}

/// Borrowed handles to the external adapters for one call.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub chain: &'a dyn ChainClient,
    pub chat: &'a dyn ChatClient,
    pub store: &'a dyn ReferendumStore,
}

/// What happened to one referendum during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Nothing due yet.
    Waiting,
    /// The chain accepted a proxy vote.
    VoteCast { stage: VoteStage, decision: Decision },
    /// The revote matched the first vote; finalized without resubmitting.
    RevoteSuppressed { decision: Decision },
    /// A due vote was held back by the gate; retried next tick.
    Vetoed { stage: VoteStage, veto: Veto },
    /// The chain did not accept the submission; retried next tick.
    SubmissionFailed { stage: VoteStage, reason: String },
    /// Finalized without casting anything.
    Finalized(FinalizeReason),
    /// Evaluation impossible (e.g. no periods for the origin).
    Skipped(String),
}

/// Per-tick summary, one entry per referendum evaluated.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub now: Timestamp,
    pub outcomes: Vec<(ReferendumIndex, TickOutcome)>,
    /// Records that changed in memory but could not be written to the store.
    pub persist_failures: Vec<(ReferendumIndex, String)>,
}

impl TickReport {
    fn new(now: Timestamp) -> Self {
        Self {
            now,
            outcomes: Vec::new(),
            persist_failures: Vec::new(),
        }
    }

    pub fn outcome(&self, index: ReferendumIndex) -> Option<&TickOutcome> {
        self.outcomes
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, o)| o)
    }

    /// Number of votes the chain accepted this tick.
    pub fn submissions(&self) -> usize {
        self.count(|o| matches!(o, TickOutcome::VoteCast { .. }))
    }

    pub fn count(&self, pred: impl Fn(&TickOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

enum PendingAction {
    None,
    Finalize(FinalizeReason),
    Vote { stage: VoteStage, backlog: bool },
}

/// Owns every [`ReferendumState`] and drives them on each tick.
pub struct Scheduler {
    policy: Arc<PeriodPolicy>,
    settings: VotingSettings,
    gate: SubmissionGate,
    referenda: BTreeMap<ReferendumIndex, ReferendumState>,
    /// Set while the balance is known to be below the floor.
    balance_alert_active: bool,
    participation_warned: HashSet<ReferendumIndex>,
    last_evaluation: HashMap<ReferendumIndex, (VoteStage, Decision)>,
}

impl Scheduler {
    pub fn new(policy: Arc<PeriodPolicy>, settings: VotingSettings, gate: SubmissionGate) -> Self {
        Self {
            policy,
            settings,
            gate,
            referenda: BTreeMap::new(),
            balance_alert_active: false,
            participation_warned: HashSet::new(),
            last_evaluation: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &PeriodPolicy {
        &self.policy
    }

    pub fn settings(&self) -> &VotingSettings {
        &self.settings
    }

    pub fn get(&self, index: ReferendumIndex) -> Option<&ReferendumState> {
        self.referenda.get(&index)
    }

    pub fn referenda(&self) -> impl Iterator<Item = &ReferendumState> {
        self.referenda.values()
    }

    pub fn len(&self) -> usize {
        self.referenda.len()
    }

    pub fn is_empty(&self) -> bool {
        self.referenda.is_empty()
    }

    /// Referenda that may still need action.
    pub fn pending_count(&self) -> usize {
        self.referenda.values().filter(|s| !s.is_finalized()).count()
    }

    pub fn balance_alert_active(&self) -> bool {
        self.balance_alert_active
    }

    /// Load every stored record. Unreadable records are logged and skipped.
    pub fn restore(&mut self, store: &dyn ReferendumStore) -> Result<usize, GovernanceError> {
        let mut restored = 0;
        for index in store.list_referenda()? {
            let bytes = match store.get_referendum(index) {
                Ok(bytes) => bytes,
                Err(StoreError::NotFound(key)) => {
                    tracing::warn!(index, key = %key, "referendum record vanished before it was read; skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match ReferendumState::from_bytes(&bytes) {
                Ok(state) if state.index() == index => {
                    self.referenda.insert(index, state);
                    restored += 1;
                }
                Ok(state) => {
                    tracing::warn!(index, stored_index = state.index(), "record index mismatch; skipping");
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "unreadable referendum record; skipping");
                }
            }
        }
        tracing::info!(restored, "restored referendum records");
        Ok(restored)
    }

    /// Start tracking a referendum. Returns `false` if it is already known.
    pub fn track(&mut self, event: NewReferendum, store: &dyn ReferendumStore) -> bool {
        if self.referenda.contains_key(&event.index) {
            return false;
        }
        let state = ReferendumState::new(event.index, event.origin, event.introduced_at);
        if let Err(e) = Self::persist(&state, store) {
            tracing::error!(index = event.index, error = %e, "failed to persist new referendum");
        }
        tracing::info!(
            index = event.index,
            origin = %event.origin,
            introduced_at = %event.introduced_at,
            "tracking referendum"
        );
        self.referenda.insert(event.index, state);
        true
    }

    /// Finalize a referendum the chain reports as no longer ongoing.
    ///
    /// Returns `true` if a tracked, unfinalized referendum was finalized.
    pub fn conclude(
        &mut self,
        index: ReferendumIndex,
        now: Timestamp,
        store: &dyn ReferendumStore,
    ) -> bool {
        let Some(state) = self.referenda.get_mut(&index) else {
            return false;
        };
        if state.is_finalized() {
            return false;
        }
        state.finalize(FinalizeReason::Concluded, now);
        if let Err(e) = Self::persist(state, store) {
            tracing::error!(index, error = %e, "failed to persist concluded referendum");
        }
        tracing::info!(index, "referendum concluded on-chain");
        self.forget(index);
        true
    }

    /// Pull new and concluded referenda from the chain.
    ///
    /// Returns `(tracked, concluded)` counts.
    pub fn ingest(
        &mut self,
        now: Timestamp,
        c: Collaborators<'_>,
    ) -> Result<(usize, usize), GovernanceError> {
        let mut tracked = 0;
        for event in c.chain.new_referendum_events()? {
            if self.track(event, c.store) {
                tracked += 1;
            }
        }
        let mut concluded = 0;
        for index in c.chain.concluded_referenda()? {
            if self.conclude(index, now, c.store) {
                concluded += 1;
            }
        }
        Ok((tracked, concluded))
    }

    /// Evaluate every unfinalized referendum once.
    ///
    /// Failures are isolated per referendum; the tick always completes.
    pub fn evaluate_tick(&mut self, now: Timestamp, c: Collaborators<'_>) -> TickReport {
        let mut report = TickReport::new(now);
        let pending: Vec<ReferendumIndex> = self
            .referenda
            .values()
            .filter(|s| !s.is_finalized())
            .map(|s| s.index())
            .collect();

        for index in pending {
            let span = tracing::info_span!("referendum", index);
            let _enter = span.enter();
            let outcome = self.evaluate_referendum(index, now, c, &mut report);
            if self
                .referenda
                .get(&index)
                .is_some_and(ReferendumState::is_finalized)
            {
                self.forget(index);
            }
            report.outcomes.push((index, outcome));
        }

        tracing::debug!(
            evaluated = report.outcomes.len(),
            submissions = report.submissions(),
            "tick complete"
        );
        report
    }

    /// Tally and submit a vote for one active referendum right now, outside
    /// the schedule.
    ///
    /// The same tally and gate apply as for a scheduled vote. The stored
    /// record is left alone: a forced vote does not count as the first or
    /// second vote, so the scheduled votes still fall due and overwrite it
    /// on-chain. Vetoes come back as [`TickOutcome::Vetoed`]; an unreadable
    /// balance or a rejected submission is an error.
    pub fn force_vote(
        &mut self,
        index: ReferendumIndex,
        now: Timestamp,
        c: Collaborators<'_>,
    ) -> Result<TickOutcome, GovernanceError> {
        let stage = match self.referenda.get(&index).map(ReferendumState::phase) {
            Some(ReferendumPhase::Tracking) => VoteStage::First,
            Some(ReferendumPhase::FirstVoteCast) => VoteStage::Second,
            Some(ReferendumPhase::Finalized) | None => {
                return Err(GovernanceError::NotTracked(index))
            }
        };

        let votes = c.chat.votes(index);
        let eligible = c.chat.eligible_voter_count(self.settings.voter_role.as_deref());
        let tally = VoteTally::compute(
            &votes,
            self.settings.threshold,
            self.settings.min_participation,
            eligible,
        );

        if self.gate.is_manual_only() {
            return Ok(TickOutcome::Vetoed {
                stage,
                veto: Veto::ManualModeOnly,
            });
        }
        let balance = c.chain.proxy_balance()?;
        let authorized = match self.gate.authorize(tally.decision, tally.participation, balance) {
            Ok(authorized) => {
                self.balance_alert_active = false;
                authorized
            }
            Err(veto) => {
                self.on_veto(veto, c.chat);
                return Ok(TickOutcome::Vetoed { stage, veto });
            }
        };

        c.chain
            .submit_vote(index, authorized.decision, authorized.conviction)
            .map_err(|e| GovernanceError::SubmissionFailure(e.to_string()))?;

        tracing::info!(
            index,
            decision = %authorized.decision,
            conviction = %authorized.conviction,
            participation = tally.participation,
            at = %now,
            "forced proxy vote accepted"
        );
        c.chat.notify(Notification::ForcedVote {
            index,
            decision: authorized.decision,
            conviction: authorized.conviction,
            tally,
        });
        Ok(TickOutcome::VoteCast {
            stage,
            decision: authorized.decision,
        })
    }

    fn evaluate_referendum(
        &mut self,
        index: ReferendumIndex,
        now: Timestamp,
        c: Collaborators<'_>,
        report: &mut TickReport,
    ) -> TickOutcome {
        let Some(state) = self.referenda.get(&index).cloned() else {
            return TickOutcome::Waiting;
        };
        let periods = match self.policy.lookup(state.origin()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(origin = %state.origin(), error = %e, "skipping referendum");
                return TickOutcome::Skipped(e.to_string());
            }
        };

        match Self::pending_action(&state, &periods, now) {
            PendingAction::None => {
                self.warn_low_participation(&state, &periods, now, c);
                TickOutcome::Waiting
            }
            PendingAction::Finalize(reason) => {
                tracing::info!(?reason, "finalizing without action");
                self.update(index, c.store, report, |s| s.finalize(reason, now));
                TickOutcome::Finalized(reason)
            }
            PendingAction::Vote { stage, backlog } => {
                self.run_vote(&state, stage, backlog, now, c, report)
            }
        }
    }

    fn pending_action(state: &ReferendumState, periods: &PeriodSet, now: Timestamp) -> PendingAction {
        let introduced = state.introduced_at();
        let decision_over = introduced.days_elapsed(periods.decision_period_days, now);
        match state.phase() {
            ReferendumPhase::Tracking => {
                if decision_over || introduced.days_elapsed(periods.internal_vote_period_days, now) {
                    PendingAction::Vote {
                        stage: VoteStage::First,
                        backlog: decision_over,
                    }
                } else {
                    PendingAction::None
                }
            }
            ReferendumPhase::FirstVoteCast => {
                if decision_over {
                    PendingAction::Finalize(FinalizeReason::DecisionPeriodElapsed)
                } else if introduced.days_elapsed(periods.revote_period_days, now) {
                    PendingAction::Vote {
                        stage: VoteStage::Second,
                        backlog: false,
                    }
                } else {
                    PendingAction::None
                }
            }
            ReferendumPhase::Finalized => PendingAction::None,
        }
    }

    fn run_vote(
        &mut self,
        state: &ReferendumState,
        stage: VoteStage,
        backlog: bool,
        now: Timestamp,
        c: Collaborators<'_>,
        report: &mut TickReport,
    ) -> TickOutcome {
        let index = state.index();
        let votes = c.chat.votes(index);
        let eligible = c.chat.eligible_voter_count(self.settings.voter_role.as_deref());
        let tally = VoteTally::compute(
            &votes,
            self.settings.threshold,
            self.settings.min_participation,
            eligible,
        );
        self.report_evaluation(index, stage, tally, c.chat);

        if stage == VoteStage::Second && state.first_vote_cast() == Some(tally.decision) {
            tracing::info!(decision = %tally.decision, "revote matches first vote; nothing resubmitted");
            self.update(index, c.store, report, |s| {
                s.finalize(FinalizeReason::RevoteUnchanged, now)
            });
            c.chat.notify(Notification::RevoteUnchanged {
                index,
                decision: tally.decision,
            });
            return TickOutcome::RevoteSuppressed {
                decision: tally.decision,
            };
        }

        if self.gate.is_manual_only() {
            tracing::debug!(decision = %tally.decision, "solo mode; vote left for manual submission");
            return TickOutcome::Vetoed {
                stage,
                veto: Veto::ManualModeOnly,
            };
        }

        let balance = match c.chain.proxy_balance() {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(error = %e, "could not read proxy balance; will retry next tick");
                return TickOutcome::SubmissionFailed {
                    stage,
                    reason: e.to_string(),
                };
            }
        };

        let authorized = match self.gate.authorize(tally.decision, tally.participation, balance) {
            Ok(authorized) => {
                self.balance_alert_active = false;
                authorized
            }
            Err(veto) => {
                self.on_veto(veto, c.chat);
                return TickOutcome::Vetoed { stage, veto };
            }
        };

        if let Err(e) = c
            .chain
            .submit_vote(index, authorized.decision, authorized.conviction)
        {
            tracing::warn!(stage = stage.ordinal(), error = %e, "vote submission failed; will retry next tick");
            return TickOutcome::SubmissionFailed {
                stage,
                reason: e.to_string(),
            };
        }

        let decision = authorized.decision;
        self.update(index, c.store, report, |s| match stage {
            VoteStage::First => {
                s.record_first_vote(decision, tally, now);
                if backlog {
                    s.finalize(FinalizeReason::Backlog, now);
                }
            }
            VoteStage::Second => {
                s.record_second_vote(decision, now);
                s.finalize(FinalizeReason::RevoteCast, now);
            }
        });
        tracing::info!(
            stage = stage.ordinal(),
            %decision,
            conviction = %authorized.conviction,
            participation = tally.participation,
            backlog,
            "proxy vote accepted"
        );
        c.chat.notify(Notification::VoteCast {
            index,
            stage,
            decision,
            conviction: authorized.conviction,
        });
        TickOutcome::VoteCast { stage, decision }
    }

    fn on_veto(&mut self, veto: Veto, chat: &dyn ChatClient) {
        match veto {
            Veto::InsufficientBalance { balance, floor } => {
                if !self.balance_alert_active {
                    self.balance_alert_active = true;
                    tracing::warn!(%balance, %floor, "proxy balance below floor; holding votes back");
                    chat.notify(Notification::BalanceAlert { balance, floor });
                }
            }
            Veto::ManualModeOnly => {}
        }
    }

    /// Notify an evaluation unless the same stage already reported this decision.
    fn report_evaluation(
        &mut self,
        index: ReferendumIndex,
        stage: VoteStage,
        tally: TallyOutcome,
        chat: &dyn ChatClient,
    ) {
        let key = (stage, tally.decision);
        if self.last_evaluation.get(&index) == Some(&key) {
            return;
        }
        self.last_evaluation.insert(index, key);
        chat.notify(Notification::Evaluation {
            index,
            stage,
            tally,
        });
    }

    fn warn_low_participation(
        &mut self,
        state: &ReferendumState,
        periods: &PeriodSet,
        now: Timestamp,
        c: Collaborators<'_>,
    ) {
        let index = state.index();
        if self.settings.min_participation <= 0.0
            || state.phase() != ReferendumPhase::Tracking
            || self.participation_warned.contains(&index)
        {
            return;
        }
        let due_at = state
            .introduced_at()
            .saturating_add_secs(u64::from(periods.internal_vote_period_days) * SECS_PER_DAY);
        let secs_remaining = now.elapsed_since(due_at);
        if secs_remaining == 0 || secs_remaining > self.settings.participation_warning_secs {
            return;
        }

        let votes_cast: f64 = c.chat.votes(index).iter().map(RawVote::effective_weight).sum();
        let eligible = c.chat.eligible_voter_count(self.settings.voter_role.as_deref());
        let participation =
            VoteTally::participation(votes_cast, eligible, self.settings.min_participation);
        if participation.meets_minimum {
            return;
        }

        self.participation_warned.insert(index);
        tracing::info!(
            votes_cast,
            eligible,
            required = participation.min_required_voters,
            secs_remaining,
            "turnout below floor ahead of first vote"
        );
        c.chat.notify(Notification::ParticipationWarning {
            index,
            votes_cast,
            eligible,
            min_required_voters: participation.min_required_voters,
            secs_remaining,
        });
    }

    fn update(
        &mut self,
        index: ReferendumIndex,
        store: &dyn ReferendumStore,
        report: &mut TickReport,
        mutate: impl FnOnce(&mut ReferendumState),
    ) {
        let Some(state) = self.referenda.get_mut(&index) else {
            return;
        };
        mutate(state);
        if let Err(e) = Self::persist(state, store) {
            tracing::error!(index, error = %e, "failed to persist referendum; in-memory state kept");
            report.persist_failures.push((index, e.to_string()));
        }
    }

    fn persist(state: &ReferendumState, store: &dyn ReferendumStore) -> Result<(), GovernanceError> {
        let bytes = state.to_bytes()?;
        store.put_referendum(state.index(), &bytes)?;
        Ok(())
    }

    fn forget(&mut self, index: ReferendumIndex) {
        self.participation_warned.remove(&index);
        self.last_evaluation.remove(&index);
    }
}
