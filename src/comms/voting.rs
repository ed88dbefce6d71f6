//! Quorum voting among swimmers

use std::collections::BTreeMap;

use crate::core::types::ObjectiveId;

/// Slack on the vote ratio for the `f32` rounding of the quorum
///
/// Far below the smallest ratio step (1 / voters) for any realistic school.
const QUORUM_EPSILON: f64 = 1e-6;

/// Votes counted at the start of a tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteTally {
    counts: BTreeMap<ObjectiveId, usize>,
    voters: usize,
}

impl VoteTally {
    /// Votes for `objective`
    pub fn votes_for(&self, objective: ObjectiveId) -> usize {
        self.counts.get(&objective).copied().unwrap_or(0)
    }

    /// Live swimmers, voting or not
    pub fn voters(&self) -> usize {
        self.voters
    }

    /// Objective with the most votes; ties go to the lower id
    pub fn leader(&self) -> Option<(ObjectiveId, usize)> {
        // BTreeMap iterates ascending, so strict `>` keeps the lowest id on ties
        let mut best: Option<(ObjectiveId, usize)> = None;
        for (&objective, &count) in &self.counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((objective, count));
            }
        }
        best
    }
}

/// Decides whether swimmers surge together on one objective
#[derive(Debug, Clone, Copy)]
pub struct VotingProtocol {
    quorum: f32,
}

impl VotingProtocol {
    pub fn new(quorum: f32) -> Self {
        Self { quorum }
    }

    /// Count one entry per live swimmer; `None` is a swimmer without a vote
    pub fn tally(votes: impl IntoIterator<Item = Option<ObjectiveId>>) -> VoteTally {
        let mut tally = VoteTally::default();
        for vote in votes {
            tally.voters += 1;
            if let Some(objective) = vote {
                *tally.counts.entry(objective).or_insert(0) += 1;
            }
        }
        tally
    }

    /// The leading objective if it reaches quorum
    pub fn surge_target(&self, tally: &VoteTally) -> Option<ObjectiveId> {
        let (objective, votes) = tally.leader()?;
        meets_quorum(votes, tally.voters, self.quorum).then_some(objective)
    }
}

/// Inclusive `votes / total >= quorum`; never true with no voters
pub fn meets_quorum(votes: usize, total: usize, quorum: f32) -> bool {
    if total == 0 || votes == 0 {
        return false;
    }
    votes as f64 / total as f64 >= quorum as f64 - QUORUM_EPSILON
}
