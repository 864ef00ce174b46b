//! Neighbor selection for a single caller in a single round.

use hashbrown::HashSet;
use indexmap::IndexSet;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::ta_interface::NodeId;

/// Picks which neighbors a caller dials in one round
#[derive(Debug, Clone, Copy)]
pub struct NeighborSampler {
    calls_per_round: usize,
}

impl NeighborSampler {
    pub fn new(calls_per_round: usize) -> Self {
        Self { calls_per_round }
    }

    pub fn calls_per_round(&self) -> usize {
        self.calls_per_round
    }

    /// Draw up to `calls_per_round` distinct neighbors not in `exclude`.
    ///
    /// When fewer candidates remain than calls are allowed, all of them are
    /// returned (in neighbor order). This is not an error.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        neighbors: &IndexSet<NodeId>,
        exclude: &HashSet<NodeId>,
    ) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = neighbors
            .iter()
            .copied()
            .filter(|n| !exclude.contains(n))
            .collect();

        if candidates.len() < self.calls_per_round {
            return candidates;
        }

        candidates
            .choose_multiple(rng, self.calls_per_round)
            .copied()
            .collect()
    }
}
