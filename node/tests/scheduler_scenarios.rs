//! Scenario tests driving the scheduler through whole referendum lifecycles
//! with deterministic collaborators: a scripted chain, a settable chat, an
//! in-memory store and a clock that only moves when told.

use std::sync::Arc;

use govproxy_governance::{
    ChainError, Collaborators, FinalizeReason, GovernanceError, NewReferendum, Notification, PeriodPolicy,
    ReferendumPhase, Scheduler, SubmissionGate, TickOutcome, Veto, VoteStage, VotingSettings,
};
use govproxy_nullables::{NullChain, NullChat, NullClock, NullStore};
use govproxy_store::JsonFileStore;
use govproxy_types::time::SECS_PER_DAY;
use govproxy_types::{Balance, Conviction, Decision, Origin, ReferendumIndex, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const FLOOR: u128 = 1_000;

struct Harness {
    chain: NullChain,
    chat: NullChat,
    store: NullStore,
    clock: NullClock,
    scheduler: Scheduler,
}

impl Harness {
    fn new(settings: VotingSettings, solo_mode: bool) -> Self {
        Self {
            chain: NullChain::new(Balance::new(FLOOR * 10)),
            chat: NullChat::new(10),
            store: NullStore::new(),
            clock: NullClock::new(0),
            scheduler: Scheduler::new(
                Arc::new(PeriodPolicy::kusama()),
                settings,
                SubmissionGate::new(Balance::new(FLOOR), Conviction::Locked1x, solo_mode),
            ),
        }
    }

    fn standard() -> Self {
        Self::new(VotingSettings::default(), false)
    }

    fn introduce(&mut self, index: ReferendumIndex, origin: Origin, introduced_at: Timestamp) {
        self.chain.push_referendum(NewReferendum {
            index,
            origin,
            introduced_at,
        });
    }

    /// Ingest chain events and evaluate once at the clock's current time.
    fn tick(&mut self) -> govproxy_governance::TickReport {
        let now = self.clock.now();
        let c = Collaborators {
            chain: &self.chain,
            chat: &self.chat,
            store: &self.store,
        };
        self.scheduler.ingest(now, c).expect("null chain never fails");
        self.scheduler.evaluate_tick(now, c)
    }

    fn force(&mut self, index: ReferendumIndex) -> Result<TickOutcome, GovernanceError> {
        let now = self.clock.now();
        let c = Collaborators {
            chain: &self.chain,
            chat: &self.chat,
            store: &self.store,
        };
        self.scheduler.force_vote(index, now, c)
    }

    fn phase(&self, index: ReferendumIndex) -> ReferendumPhase {
        self.scheduler.get(index).expect("tracked").phase()
    }
}

// ---------------------------------------------------------------------------
// 1. The Kusama SmallTipper lifecycle
// ---------------------------------------------------------------------------

#[test]
fn small_tipper_first_vote_then_changed_revote() {
    let mut h = Harness::standard();
    h.introduce(7, Origin::SmallTipper, Timestamp::EPOCH);

    // 80% aye at t=1d, turnout 10/10
    h.chat.set_counts(7, 8, 2, 0);
    h.clock.set(SECS_PER_DAY);
    let report = h.tick();
    assert_eq!(
        report.outcome(7),
        Some(&TickOutcome::VoteCast { stage: VoteStage::First, decision: Decision::Aye })
    );
    assert_eq!(h.phase(7), ReferendumPhase::FirstVoteCast);

    // quiet until the revote boundary
    h.clock.set(4 * SECS_PER_DAY - 1);
    assert_eq!(h.tick().outcome(7), Some(&TickOutcome::Waiting));

    // 70% nay at t=4d
    h.chat.set_counts(7, 3, 7, 0);
    h.clock.set(4 * SECS_PER_DAY);
    let report = h.tick();
    assert_eq!(
        report.outcome(7),
        Some(&TickOutcome::VoteCast { stage: VoteStage::Second, decision: Decision::Nay })
    );

    let state = h.scheduler.get(7).unwrap();
    assert_eq!(state.phase(), ReferendumPhase::Finalized);
    assert_eq!(state.first_vote_cast(), Some(Decision::Aye));
    assert_eq!(state.second_vote_cast(), Some(Decision::Nay));
    assert_eq!(state.finalize_reason(), Some(FinalizeReason::RevoteCast));

    // t=7d: terminal, nothing further
    h.clock.set(7 * SECS_PER_DAY);
    let report = h.tick();
    assert!(report.outcomes.is_empty());

    let submitted = h.chain.submissions_for(7);
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].decision, Decision::Aye);
    assert_eq!(submitted[1].decision, Decision::Nay);
    assert!(submitted.iter().all(|v| v.conviction == Conviction::Locked1x));
}

// ---------------------------------------------------------------------------
// 2. Idempotence and revote handling
// ---------------------------------------------------------------------------

#[test]
fn repeated_tick_at_same_time_is_idempotent() {
    let mut h = Harness::standard();
    h.introduce(1, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(1, 9, 1, 0);
    h.clock.set(SECS_PER_DAY);

    h.tick();
    let after_first = h.scheduler.get(1).cloned();
    let report = h.tick();

    assert_eq!(report.submissions(), 0);
    assert_eq!(report.outcome(1), Some(&TickOutcome::Waiting));
    assert_eq!(h.scheduler.get(1).cloned(), after_first);
    assert_eq!(h.chain.submitted().len(), 1);
}

#[test]
fn unchanged_revote_is_not_resubmitted() {
    let mut h = Harness::standard();
    h.introduce(2, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(2, 8, 2, 0);
    h.clock.set(SECS_PER_DAY);
    h.tick();

    h.clock.set(4 * SECS_PER_DAY);
    let report = h.tick();
    assert_eq!(
        report.outcome(2),
        Some(&TickOutcome::RevoteSuppressed { decision: Decision::Aye })
    );
    assert_eq!(h.chain.submissions_for(2).len(), 1);
    assert_eq!(
        h.scheduler.get(2).unwrap().finalize_reason(),
        Some(FinalizeReason::RevoteUnchanged)
    );
    assert!(h
        .chat
        .notifications()
        .contains(&Notification::RevoteUnchanged { index: 2, decision: Decision::Aye }));
}

#[test]
fn missed_revote_window_finalizes_without_action() {
    let mut h = Harness::standard();
    h.introduce(3, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(3, 8, 2, 0);
    h.clock.set(SECS_PER_DAY);
    h.tick();

    // process was down from day 1 to day 8
    h.chat.set_counts(3, 0, 10, 0);
    h.clock.set(8 * SECS_PER_DAY);
    let report = h.tick();
    assert_eq!(
        report.outcome(3),
        Some(&TickOutcome::Finalized(FinalizeReason::DecisionPeriodElapsed))
    );
    assert_eq!(h.chain.submissions_for(3).len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Backlog
// ---------------------------------------------------------------------------

#[test]
fn backlog_referendum_gets_exactly_one_vote() {
    let mut h = Harness::standard();
    h.clock.set(30 * SECS_PER_DAY);
    h.introduce(4, Origin::Treasurer, Timestamp::from_days(10)); // 20 days old, decision = 14
    h.chat.set_counts(4, 1, 9, 0);

    let report = h.tick();
    assert_eq!(
        report.outcome(4),
        Some(&TickOutcome::VoteCast { stage: VoteStage::First, decision: Decision::Nay })
    );
    let state = h.scheduler.get(4).unwrap();
    assert_eq!(state.phase(), ReferendumPhase::Finalized);
    assert_eq!(state.finalize_reason(), Some(FinalizeReason::Backlog));

    h.clock.advance_days(30);
    h.chat.set_counts(4, 10, 0, 0);
    h.tick();
    assert_eq!(h.chain.submissions_for(4).len(), 1);
}

// ---------------------------------------------------------------------------
// 4. Vetoes and failures never advance state
// ---------------------------------------------------------------------------

#[test]
fn low_balance_vetoes_and_retries_next_tick() {
    let mut h = Harness::standard();
    h.chain.set_balance(Balance::new(FLOOR - 1));
    h.introduce(5, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(5, 10, 0, 0);
    h.clock.set(SECS_PER_DAY);

    let report = h.tick();
    assert!(matches!(
        report.outcome(5),
        Some(TickOutcome::Vetoed { veto: Veto::InsufficientBalance { .. }, .. })
    ));
    assert_eq!(h.phase(5), ReferendumPhase::Tracking);
    assert!(h.chain.submitted().is_empty());

    // still low: no second alert
    h.clock.advance(60);
    h.tick();
    let alerts = h
        .chat
        .notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::BalanceAlert { .. }))
        .count();
    assert_eq!(alerts, 1);

    // topped up: the same pending first vote goes through
    h.chain.set_balance(Balance::new(FLOOR));
    h.clock.advance(60);
    let report = h.tick();
    assert_eq!(report.submissions(), 1);
    assert_eq!(h.phase(5), ReferendumPhase::FirstVoteCast);
    assert!(!h.scheduler.balance_alert_active());
}

#[test]
fn balance_alert_rearms_after_recovery() {
    let mut h = Harness::standard();
    h.introduce(1, Origin::SmallTipper, Timestamp::EPOCH);
    h.introduce(2, Origin::Root, Timestamp::EPOCH);
    h.chat.set_counts(1, 10, 0, 0);
    h.chat.set_counts(2, 10, 0, 0);

    h.chain.set_balance(Balance::new(0));
    h.clock.set(SECS_PER_DAY);
    h.tick();
    h.chain.set_balance(Balance::new(FLOOR));
    h.tick(); // referendum 1 votes; alert cleared
    h.chain.set_balance(Balance::new(0));
    h.clock.set(3 * SECS_PER_DAY);
    h.tick(); // referendum 2 due, low again

    let alerts = h
        .chat
        .notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::BalanceAlert { .. }))
        .count();
    assert_eq!(alerts, 2);
}

#[test]
fn rejected_submission_leaves_state_unchanged() {
    let mut h = Harness::standard();
    h.introduce(6, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(6, 10, 0, 0);
    h.clock.set(SECS_PER_DAY);
    h.chain
        .fail_next_submission(ChainError::Rejected("priority too low".into()));

    let report = h.tick();
    assert!(matches!(
        report.outcome(6),
        Some(TickOutcome::SubmissionFailed { stage: VoteStage::First, .. })
    ));
    assert_eq!(h.phase(6), ReferendumPhase::Tracking);

    let report = h.tick();
    assert_eq!(report.submissions(), 1);
}

#[test]
fn unreadable_balance_is_a_retryable_failure() {
    let mut h = Harness::standard();
    h.chain.set_balance_unavailable(true);
    h.introduce(8, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(8, 10, 0, 0);
    h.clock.set(SECS_PER_DAY);

    assert!(matches!(
        h.tick().outcome(8),
        Some(TickOutcome::SubmissionFailed { .. })
    ));
    h.chain.set_balance_unavailable(false);
    assert_eq!(h.tick().submissions(), 1);
}

#[test]
fn solo_mode_never_submits_but_reports() {
    let mut h = Harness::new(VotingSettings::default(), true);
    h.introduce(9, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(9, 10, 0, 0);
    for day in 1..10 {
        h.clock.set(day * SECS_PER_DAY);
        h.tick();
    }
    assert!(h.chain.submitted().is_empty());
    assert_eq!(h.phase(9), ReferendumPhase::Tracking);
    assert!(h.chat.notifications().iter().any(|n| matches!(
        n,
        Notification::Evaluation { index: 9, tally, .. } if tally.decision == Decision::Aye
    )));
}

// ---------------------------------------------------------------------------
// 5. Turnout
// ---------------------------------------------------------------------------

#[test]
fn low_turnout_casts_abstain() {
    let settings = VotingSettings {
        min_participation: 50.0,
        ..VotingSettings::default()
    };
    let mut h = Harness::new(settings, false);
    h.chat.set_eligible(100);
    h.introduce(10, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(10, 20, 0, 0);
    h.clock.set(SECS_PER_DAY);

    assert_eq!(
        h.tick().outcome(10),
        Some(&TickOutcome::VoteCast { stage: VoteStage::First, decision: Decision::Abstain })
    );
}

#[test]
fn recusals_count_toward_turnout_only() {
    let settings = VotingSettings {
        min_participation: 50.0,
        ..VotingSettings::default()
    };
    let mut h = Harness::new(settings, false);
    h.chat.set_eligible(10);
    h.introduce(11, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(11, 3, 0, 2); // 5/10 turnout, 100% aye of aye+nay
    h.clock.set(SECS_PER_DAY);

    assert_eq!(
        h.tick().outcome(11),
        Some(&TickOutcome::VoteCast { stage: VoteStage::First, decision: Decision::Aye })
    );
}

#[test]
fn participation_warning_is_sent_once_ahead_of_first_vote() {
    let settings = VotingSettings {
        min_participation: 50.0,
        participation_warning_secs: 6 * 3600,
        ..VotingSettings::default()
    };
    let mut h = Harness::new(settings, false);
    h.chat.set_eligible(10);
    h.introduce(12, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(12, 2, 0, 0);

    // too early to warn
    h.clock.set(SECS_PER_DAY - 7 * 3600);
    h.tick();
    // inside the window, twice
    h.clock.set(SECS_PER_DAY - 3600);
    h.tick();
    h.clock.advance(60);
    h.tick();

    let warnings: Vec<_> = h
        .chat
        .notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::ParticipationWarning { .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
    match &warnings[0] {
        Notification::ParticipationWarning {
            index,
            eligible,
            min_required_voters,
            secs_remaining,
            ..
        } => {
            assert_eq!(*index, 12);
            assert_eq!(*eligible, 10);
            assert_eq!(*min_required_voters, 5);
            assert_eq!(*secs_remaining, 3600);
        }
        other => panic!("unexpected notification {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 6. Conclusion, unknown origins, restart
// ---------------------------------------------------------------------------

#[test]
fn concluded_referendum_is_finalized_without_voting() {
    let mut h = Harness::standard();
    h.introduce(13, Origin::BigSpender, Timestamp::EPOCH);
    h.tick();
    h.chain.push_concluded(13);
    h.clock.set(5 * SECS_PER_DAY);
    let report = h.tick();

    assert!(report.outcome(13).is_none());
    assert_eq!(
        h.scheduler.get(13).unwrap().finalize_reason(),
        Some(FinalizeReason::Concluded)
    );
    assert!(h.chain.submitted().is_empty());
}

#[test]
fn unknown_origin_is_skipped_without_stopping_the_tick() {
    let mut table = std::collections::BTreeMap::new();
    table.insert(
        Origin::SmallTipper,
        PeriodPolicy::kusama().lookup(Origin::SmallTipper).unwrap(),
    );
    let policy = PeriodPolicy::new(table).unwrap();
    let mut h = Harness::standard();
    h.scheduler = Scheduler::new(
        Arc::new(policy),
        VotingSettings::default(),
        SubmissionGate::new(Balance::new(FLOOR), Conviction::None, false),
    );
    h.introduce(20, Origin::Root, Timestamp::EPOCH);
    h.introduce(21, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(21, 10, 0, 0);
    h.clock.set(SECS_PER_DAY);

    let report = h.tick();
    assert!(matches!(report.outcome(20), Some(TickOutcome::Skipped(_))));
    assert_eq!(report.submissions(), 1);
}

#[test]
fn restart_resumes_from_stored_state() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = JsonFileStore::open(dir.path()).expect("open store");
    let chain = NullChain::new(Balance::new(FLOOR));
    let chat = NullChat::new(10);
    let gate = || SubmissionGate::new(Balance::new(FLOOR), Conviction::None, false);
    let c = Collaborators {
        chain: &chain,
        chat: &chat,
        store: &store,
    };

    let mut before = Scheduler::new(Arc::new(PeriodPolicy::kusama()), VotingSettings::default(), gate());
    chain.push_referendum(NewReferendum {
        index: 30,
        origin: Origin::SmallTipper,
        introduced_at: Timestamp::EPOCH,
    });
    chat.set_counts(30, 10, 0, 0);
    before.ingest(Timestamp::from_days(1), c).unwrap();
    before.evaluate_tick(Timestamp::from_days(1), c);
    drop(before);

    let mut after = Scheduler::new(Arc::new(PeriodPolicy::kusama()), VotingSettings::default(), gate());
    assert_eq!(after.restore(&store).unwrap(), 1);
    assert_eq!(after.get(30).unwrap().phase(), ReferendumPhase::FirstVoteCast);

    // the restarted process does not vote again at the same age
    after.evaluate_tick(Timestamp::from_days(2), c);
    assert_eq!(chain.submitted().len(), 1);

    chat.set_counts(30, 0, 10, 0);
    after.evaluate_tick(Timestamp::from_days(4), c);
    assert_eq!(chain.submitted().len(), 2);
    assert_eq!(after.get(30).unwrap().second_vote_cast(), Some(Decision::Nay));
}

#[test]
fn store_failure_after_acceptance_keeps_memory_state() {
    let mut h = Harness::standard();
    h.introduce(40, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(40, 10, 0, 0);
    h.tick();
    h.store.set_fail_writes(true);
    h.clock.set(SECS_PER_DAY);

    let report = h.tick();
    assert_eq!(report.submissions(), 1);
    assert_eq!(report.persist_failures.len(), 1);
    assert_eq!(h.phase(40), ReferendumPhase::FirstVoteCast);
}

// ---------------------------------------------------------------------------
// 7. Forced votes
// ---------------------------------------------------------------------------

#[test]
fn forced_vote_submits_early_without_moving_the_schedule() {
    let mut h = Harness::standard();
    h.introduce(50, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(50, 9, 1, 0);
    h.clock.set(SECS_PER_DAY / 4);
    h.tick();

    let outcome = h.force(50).expect("forced vote accepted");
    assert_eq!(
        outcome,
        TickOutcome::VoteCast { stage: VoteStage::First, decision: Decision::Aye }
    );
    assert_eq!(h.chain.submissions_for(50).len(), 1);
    assert_eq!(h.phase(50), ReferendumPhase::Tracking);
    assert!(h.chat.notifications().iter().any(|n| matches!(
        n,
        Notification::ForcedVote { index: 50, decision: Decision::Aye, .. }
    )));

    // the scheduled first vote still falls due and reflects the later tally
    h.chat.set_counts(50, 1, 9, 0);
    h.clock.set(SECS_PER_DAY);
    let report = h.tick();
    assert_eq!(
        report.outcome(50),
        Some(&TickOutcome::VoteCast { stage: VoteStage::First, decision: Decision::Nay })
    );
    assert_eq!(h.scheduler.get(50).unwrap().first_vote_cast(), Some(Decision::Nay));
    assert_eq!(h.chain.submissions_for(50).len(), 2);
}

#[test]
fn forced_vote_respects_the_gate() {
    let mut h = Harness::new(VotingSettings::default(), true);
    h.introduce(51, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(51, 9, 1, 0);
    h.tick();
    assert_eq!(
        h.force(51).unwrap(),
        TickOutcome::Vetoed { stage: VoteStage::First, veto: Veto::ManualModeOnly }
    );

    let mut h = Harness::standard();
    h.introduce(52, Origin::SmallTipper, Timestamp::EPOCH);
    h.chat.set_counts(52, 9, 1, 0);
    h.tick();
    h.chain.set_balance(Balance::new(FLOOR - 1));
    assert!(matches!(
        h.force(52).unwrap(),
        TickOutcome::Vetoed { veto: Veto::InsufficientBalance { .. }, .. }
    ));
    assert!(h.chain.submitted().is_empty());
    assert!(h.scheduler.balance_alert_active());
}

#[test]
fn forced_vote_needs_an_active_referendum() {
    let mut h = Harness::standard();
    assert!(matches!(h.force(404), Err(GovernanceError::NotTracked(404))));

    h.introduce(53, Origin::SmallTipper, Timestamp::EPOCH);
    h.tick();
    h.chain.fail_next_submission(ChainError::Rejected("ongoing check failed".into()));
    assert!(matches!(h.force(53), Err(GovernanceError::SubmissionFailure(_))));
    assert_eq!(h.phase(53), ReferendumPhase::Tracking);
}
