use proptest::prelude::*;

use govproxy_governance::{PeriodPolicy, PeriodSet, RawVote, VoteTally};
use govproxy_types::{Decision, Origin, VoteChoice};

fn ballots(aye: u32, nay: u32, recuse: u32) -> Vec<RawVote> {
    let mut out = Vec::new();
    out.extend((0..aye).map(|i| RawVote::new(format!("a{i}"), VoteChoice::Aye)));
    out.extend((0..nay).map(|i| RawVote::new(format!("n{i}"), VoteChoice::Nay)));
    out.extend((0..recuse).map(|i| RawVote::new(format!("r{i}"), VoteChoice::Recuse)));
    out
}

proptest! {
    /// Only recuse ballots (or none at all) always abstain with zero participation.
    #[test]
    fn no_aye_or_nay_abstains(
        recuse in 0u32..50,
        eligible in 0u32..500,
        threshold in 0.5f64..1.0,
        min in 0.0f64..100.0,
    ) {
        let out = VoteTally::compute(&ballots(0, 0, recuse), threshold, min, eligible);
        prop_assert_eq!(out.decision, Decision::Abstain);
        prop_assert_eq!(out.participation, 0.0);
    }

    /// Turnout below the floor abstains no matter how lopsided the vote.
    #[test]
    fn low_turnout_abstains(
        aye in 1u32..20,
        extra in 1u32..1000,
    ) {
        let eligible = aye + extra;
        // floor strictly above the actual turnout
        let min = (f64::from(aye) / f64::from(eligible)) * 100.0 + 0.5;
        let out = VoteTally::compute(&ballots(aye, 0, 0), 0.66, min, eligible);
        prop_assert_eq!(out.decision, Decision::Abstain);
    }

    /// A non-Abstain decision always has at least `threshold` of the aye+nay weight.
    #[test]
    fn winner_meets_threshold(
        aye in 0u32..200,
        nay in 0u32..200,
        threshold in 0.51f64..1.0,
    ) {
        let out = VoteTally::compute(&ballots(aye, nay, 0), threshold, 0.0, 0);
        let total = f64::from(aye + nay);
        match out.decision {
            Decision::Aye => prop_assert!(f64::from(aye) / total >= threshold),
            Decision::Nay => prop_assert!(f64::from(nay) / total >= threshold),
            Decision::Abstain => {}
        }
    }

    /// Same input, same output.
    #[test]
    fn tally_is_deterministic(
        aye in 0u32..100,
        nay in 0u32..100,
        recuse in 0u32..100,
        eligible in 0u32..400,
        min in 0.0f64..100.0,
    ) {
        let votes = ballots(aye, nay, recuse);
        let a = VoteTally::compute(&votes, 0.66, min, eligible);
        let b = VoteTally::compute(&votes, 0.66, min, eligible);
        prop_assert_eq!(a, b);
    }

    /// Ballot order never changes the decision.
    #[test]
    fn tally_ignores_ballot_order(aye in 0u32..50, nay in 0u32..50) {
        let mut votes = ballots(aye, nay, 0);
        let forward = VoteTally::compute(&votes, 0.66, 0.0, 0);
        votes.reverse();
        let reversed = VoteTally::compute(&votes, 0.66, 0.0, 0);
        prop_assert_eq!(forward.decision, reversed.decision);
    }

    /// Minimum required voters is the smallest count that meets the floor.
    #[test]
    fn min_required_voters_meets_floor(eligible in 1u32..5000, min in 0.1f64..100.0) {
        let report = VoteTally::participation(0.0, eligible, min);
        let required = report.min_required_voters;
        prop_assert!(VoteTally::participation(f64::from(required), eligible, min).meets_minimum);
        if required > 0 {
            prop_assert!(!VoteTally::participation(f64::from(required - 1), eligible, min).meets_minimum);
        }
    }

    /// Any ordered triple passes validation; any other is rejected.
    #[test]
    fn period_validation_matches_ordering(
        decision in 0u32..60,
        internal in 0u32..60,
        revote in 0u32..60,
    ) {
        let set = PeriodSet::new(decision, internal, revote);
        let ordered = internal < revote && revote <= decision;
        prop_assert_eq!(set.validate(Origin::Root).is_ok(), ordered);
    }
}

#[test]
fn every_builtin_origin_resolves() {
    for policy in [PeriodPolicy::kusama(), PeriodPolicy::polkadot()] {
        for origin in Origin::ALL {
            assert!(policy.lookup(origin).is_ok(), "{origin} missing");
        }
    }
}
