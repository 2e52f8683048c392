//! Internal vote tally: turns raw ballots into the decision the proxy casts.
//!
//! The tally is a pure function of its inputs. Turnout is checked before the
//! majority: an insufficient turnout yields Abstain whatever the split.

use govproxy_types::{Decision, VoteChoice};
use serde::{Deserialize, Serialize};

/// Threshold used when the configured threshold is zero.
pub const DEFAULT_THRESHOLD: f64 = 0.66;

/// A single internal ballot, supplied by the chat collaborator at tally time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawVote {
    pub voter_id: String,
    pub choice: VoteChoice,
    /// Optional positive weight. Missing or non-positive weights count as 1.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl RawVote {
    pub fn new(voter_id: impl Into<String>, choice: VoteChoice) -> Self {
        Self {
            voter_id: voter_id.into(),
            choice,
            weight: None,
        }
    }

    pub fn weighted(voter_id: impl Into<String>, choice: VoteChoice, weight: f64) -> Self {
        Self {
            voter_id: voter_id.into(),
            choice,
            weight: Some(weight),
        }
    }

    /// The weight this ballot contributes to its side.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => 1.0,
        }
    }
}

/// Result of a tally: the decision plus the figures it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TallyOutcome {
    pub decision: Decision,
    /// Turnout as a fraction of eligible voters (1.0 when the eligible count is unknown).
    pub participation: f64,
    pub aye: f64,
    pub nay: f64,
    pub recuse: f64,
}

/// Turnout against the configured participation floor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipationReport {
    pub eligible: u32,
    pub votes_cast: f64,
    /// `ceil(eligible * min_participation / 100)`.
    pub min_required_voters: u32,
    /// Actual turnout in percent.
    pub participation_pct: f64,
    pub meets_minimum: bool,
}

impl ParticipationReport {
    /// Ballots still missing before the floor is met.
    pub fn votes_short(&self) -> u32 {
        let cast = self.votes_cast.floor().max(0.0) as u32;
        self.min_required_voters.saturating_sub(cast)
    }
}

/// Stateless tally over raw ballots.
pub struct VoteTally;

impl VoteTally {
    /// Compute the proxy decision for a set of ballots.
    ///
    /// - `threshold`: winning share in `(0, 1]`; `0` selects [`DEFAULT_THRESHOLD`].
    /// - `min_participation`: turnout floor in percent; `0` disables the check.
    /// - `eligible_voter_count`: `0` disables the check (participation reads as 1.0).
    ///
    /// Recuse ballots count toward turnout only.
    pub fn compute(
        votes: &[RawVote],
        threshold: f64,
        min_participation: f64,
        eligible_voter_count: u32,
    ) -> TallyOutcome {
        let (mut aye, mut nay, mut recuse) = (0.0_f64, 0.0_f64, 0.0_f64);
        for vote in votes {
            let w = vote.effective_weight();
            match vote.choice {
                VoteChoice::Aye => aye += w,
                VoteChoice::Nay => nay += w,
                VoteChoice::Recuse => recuse += w,
            }
        }

        let total = aye + nay;
        if total == 0.0 {
            return TallyOutcome {
                decision: Decision::Abstain,
                participation: 0.0,
                aye,
                nay,
                recuse,
            };
        }

        let cast = total + recuse;
        let participation = if eligible_voter_count > 0 {
            cast / f64::from(eligible_voter_count)
        } else {
            1.0
        };

        let outcome = |decision| TallyOutcome {
            decision,
            participation,
            aye,
            nay,
            recuse,
        };

        if !Self::meets_floor(cast, eligible_voter_count, min_participation) {
            return outcome(Decision::Abstain);
        }

        let effective_threshold = if threshold > 0.0 {
            threshold
        } else {
            DEFAULT_THRESHOLD
        };
        let aye_pct = aye / total;
        let nay_pct = nay / total;

        if aye_pct >= effective_threshold {
            outcome(Decision::Aye)
        } else if nay_pct >= effective_threshold {
            outcome(Decision::Nay)
        } else {
            outcome(Decision::Abstain)
        }
    }

    /// Turnout report for `votes_cast` ballots out of `eligible` members.
    pub fn participation(
        votes_cast: f64,
        eligible: u32,
        min_participation: f64,
    ) -> ParticipationReport {
        let eligible_f = f64::from(eligible);
        let min_required_voters = if min_participation > 0.0 {
            // nudge the rounded estimate onto the exact boundary of `meets_floor`
            let mut n = (eligible_f * min_participation / 100.0).ceil() as u32;
            while n < eligible && !Self::meets_floor(f64::from(n), eligible, min_participation) {
                n += 1;
            }
            while n > 0 && Self::meets_floor(f64::from(n - 1), eligible, min_participation) {
                n -= 1;
            }
            n
        } else {
            0
        };
        let participation_pct = if eligible > 0 {
            votes_cast / eligible_f * 100.0
        } else {
            100.0
        };
        ParticipationReport {
            eligible,
            votes_cast,
            min_required_voters,
            participation_pct,
            meets_minimum: Self::meets_floor(votes_cast, eligible, min_participation),
        }
    }

    /// `cast / eligible * 100 >= min`, evaluated without dividing so that
    /// integral ballot counts land exactly on the boundary.
    fn meets_floor(cast: f64, eligible: u32, min_participation: f64) -> bool {
        if min_participation <= 0.0 || eligible == 0 {
            return true;
        }
        cast * 100.0 >= min_participation * f64::from(eligible)
    }
}
