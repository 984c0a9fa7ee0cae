//! Kick-vote collection and tallying.

use std::collections::{HashMap, HashSet};

use super::entities::Username;
use super::errors::GameError;

/// Collects kick votes per target. Vote sets live until a reset, until the
/// target is removed, or until a voter leaves the game.
#[derive(Debug, Default)]
pub struct KickArbiter {
    votes: HashMap<Username, HashSet<Username>>,
}

impl KickArbiter {
    /// Record a vote against `target`, returning the updated tally.
    /// The caller is responsible for checking that the target is an active
    /// player; self-votes and repeat votes are rejected here.
    pub fn vote(&mut self, voter: &Username, target: &Username) -> Result<usize, GameError> {
        if voter == target {
            return Err(GameError::SelfKick);
        }
        let against = self.votes.entry(target.clone()).or_default();
        if !against.insert(voter.clone()) {
            return Err(GameError::DuplicateVote);
        }
        Ok(against.len())
    }

    #[must_use]
    pub fn votes_against(&self, target: &Username) -> usize {
        self.votes.get(target).map_or(0, HashSet::len)
    }

    /// Whether the tally against `target` clears the threshold. Strictly
    /// greater than: with 3 eligible voters, 2 votes (66.6%) is not enough
    /// at a 0.70 threshold.
    #[must_use]
    pub fn passes(&self, target: &Username, eligible: usize, threshold: f64) -> bool {
        if eligible == 0 {
            return false;
        }
        self.votes_against(target) as f64 / eligible as f64 > threshold
    }

    /// Clear every running vote. Called on round reset.
    pub fn clear(&mut self) {
        self.votes.clear();
    }

    /// Drop a departed player both as a target and as a voter elsewhere.
    pub fn purge(&mut self, name: &Username) {
        self.votes.remove(name);
        for against in self.votes.values_mut() {
            against.remove(name);
        }
    }
}
