//! Telephone Avalanche Simulation
//!
//! Round-based propagation over a connected graph:
//!
//! - **Round 0** seeds the start nodes with a call count of 1.
//! - **Round 1** lets every seed call up to `calls_per_round` of its neighbors.
//! - **Round r >= 2** lets every node that was first reached in round `r - 1`
//!   call up to `calls_per_round` neighbors, skipping the nodes that called it.
//!   A node only ever calls in the round right after it was first reached.
//!
//! After each round the number of reached nodes is compared with the previous
//! round. The first round without growth terminates the run; its snapshot is
//! not kept in the history.

use hashbrown::HashSet;
use log::{debug, info};
use rand::Rng;

use crate::ta_error::ConfigError;
use crate::ta_graph::Graph;
use crate::ta_interface::{CallCount, Event, EventSink, NodeId, Round, Snapshot};
use crate::ta_sampler::NeighborSampler;

// ============================================================================
// Call State
// ============================================================================

/// Call bookkeeping for one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct CallState {
    /// Times each node has been called
    call_count: Vec<CallCount>,

    /// Callers of each node, in call order
    called_by: Vec<Vec<NodeId>>,

    /// Snapshot of `call_count` after every kept round
    history: Vec<Snapshot>,
}

impl CallState {
    fn new(nodes: usize) -> Self {
        Self {
            call_count: vec![0; nodes],
            called_by: vec![Vec::new(); nodes],
            history: Vec::new(),
        }
    }

    /// Current call count per node. After termination this includes calls
    /// placed in the final, non-growing round.
    pub fn call_count(&self) -> &[CallCount] {
        &self.call_count
    }

    /// Nodes that called `node`, in the order the calls happened
    pub fn called_by(&self, node: NodeId) -> &[NodeId] {
        self.called_by.get(node).map_or(&[], Vec::as_slice)
    }

    /// One snapshot per kept round
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn is_reached(&self, node: NodeId) -> bool {
        self.call_count.get(node).map_or(false, |&c| c > 0)
    }

    /// Number of nodes with a positive call count
    pub fn reached(&self) -> usize {
        self.call_count.iter().filter(|&&c| c > 0).count()
    }

    /// Nodes that were unreached two rounds ago and reached one round ago
    fn newly_reached(&self, round: Round) -> Vec<NodeId> {
        let (before, last) = (&self.history[round - 2], &self.history[round - 1]);
        before
            .iter()
            .zip(last)
            .enumerate()
            .filter(|(_, (b, l))| **b == 0 && **l > 0)
            .map(|(node, _)| node)
            .collect()
    }
}

// ============================================================================
// Phase and Outcome
// ============================================================================

/// Lifecycle of an `AvalancheSimulator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Nothing has run yet
    Init,
    /// Round 0 ran: the seeds are informed
    Seeding,
    /// At least one calling round ran and reach is still growing
    Propagating,
    /// No further rounds will run
    Terminated,
}

/// How far the avalanche got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every node was reached after `calling_rounds` rounds of calls
    Full { calling_rounds: Round },

    /// Growth stopped in round `stalled_at` with only `reached` nodes informed
    Partial { reached: usize, stalled_at: Round },

    /// `max_iteration` ran out while reach was still growing
    Inconclusive { reached: usize, rounds: usize },
}

impl Coverage {
    pub fn is_full(&self) -> bool {
        matches!(self, Coverage::Full { .. })
    }
}

/// Final state of a finished simulation
#[derive(Debug, Clone, PartialEq)]
pub struct AvalancheRun {
    pub state: CallState,
    pub coverage: Coverage,
}

// ============================================================================
// Simulator
// ============================================================================

/// Drives the round loop over a borrowed graph
pub struct AvalancheSimulator<'g> {
    graph: &'g Graph,
    sampler: NeighborSampler,
    max_iteration: usize,
    start_nodes: Vec<NodeId>,

    round: Round,
    phase: SimulationPhase,
    last_reached: usize,
    coverage: Option<Coverage>,
    state: CallState,
}

impl<'g> AvalancheSimulator<'g> {
    pub fn new(
        graph: &'g Graph,
        sampler: NeighborSampler,
        max_iteration: usize,
        start_nodes: Vec<NodeId>,
    ) -> Result<Self, ConfigError> {
        if max_iteration == 0 {
            return Err(ConfigError::NoIterations);
        }
        if start_nodes.is_empty() {
            return Err(ConfigError::NoStartNodes);
        }
        if let Some(&node) = start_nodes.iter().find(|&&n| n >= graph.node_count()) {
            return Err(ConfigError::StartNodeOutOfRange {
                node,
                nodes: graph.node_count(),
            });
        }
        debug!(
            "Simulator over {} nodes: {} seed(s), {} call(s) per round, at most {} iteration(s)",
            graph.node_count(),
            start_nodes.len(),
            sampler.calls_per_round(),
            max_iteration
        );

        Ok(Self {
            graph,
            sampler,
            max_iteration,
            start_nodes,
            round: 0,
            phase: SimulationPhase::Init,
            last_reached: 0,
            coverage: None,
            state: CallState::new(graph.node_count()),
        })
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Index of the next round to run
    pub fn round(&self) -> Round {
        self.round
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    /// Set once the simulator has terminated
    pub fn coverage(&self) -> Option<Coverage> {
        self.coverage
    }

    /// Run rounds until termination and hand back the final state
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R, sink: &mut dyn EventSink) -> AvalancheRun {
        while self.step(rng, sink) != SimulationPhase::Terminated {}

        let coverage = self.coverage.unwrap_or(Coverage::Inconclusive {
            reached: self.last_reached,
            rounds: self.state.history.len(),
        });
        AvalancheRun {
            state: self.state,
            coverage,
        }
    }

    /// Run a single round. Does nothing once terminated.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, sink: &mut dyn EventSink) -> SimulationPhase {
        if self.phase == SimulationPhase::Terminated {
            return self.phase;
        }

        let round = self.round;
        let callers = match round {
            0 => {
                self.seed();
                0
            }
            1 => {
                let seeds: Vec<NodeId> = (0..self.graph.node_count())
                    .filter(|&n| self.state.call_count[n] == 1)
                    .collect();
                self.place_calls(rng, sink, round, &seeds, false)
            }
            _ => {
                let callers = self.state.newly_reached(round);
                self.place_calls(rng, sink, round, &callers, true)
            }
        };

        let reached = self.state.reached();
        let newly_reached = reached - self.last_reached.min(reached);
        sink.log(
            round,
            Event::RoundCompleted {
                callers,
                reached,
                newly_reached,
            },
        );
        debug!(
            "Round {}: {} caller(s), {} reached (+{})",
            round, callers, reached, newly_reached
        );

        if reached == self.last_reached {
            // stagnated: drop this round from history
            self.terminate(sink, round, reached);
            return self.phase;
        }

        self.state.history.push(self.state.call_count.clone());
        self.last_reached = reached;
        self.round += 1;
        self.phase = if round == 0 {
            SimulationPhase::Seeding
        } else {
            SimulationPhase::Propagating
        };

        if self.round >= self.max_iteration {
            self.exhaust(sink, reached);
        }
        self.phase
    }

    fn seed(&mut self) {
        self.state.call_count.iter_mut().for_each(|c| *c = 0);
        for &node in &self.start_nodes {
            self.state.call_count[node] = 1;
        }
    }

    /// Let every caller dial its sampled neighbors. Returns the number of callers.
    fn place_calls<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        sink: &mut dyn EventSink,
        round: Round,
        callers: &[NodeId],
        exclude_callers: bool,
    ) -> usize {
        let graph = self.graph;
        for &caller in callers {
            let Some(neighbors) = graph.neighbors(caller) else {
                continue;
            };

            // read at the caller's turn, so calls placed earlier this round count
            let exclude: HashSet<NodeId> = if exclude_callers {
                self.state.called_by[caller].iter().copied().collect()
            } else {
                HashSet::new()
            };

            for callee in self.sampler.sample(rng, neighbors, &exclude) {
                self.state.call_count[callee] += 1;
                self.state.called_by[callee].push(caller);
                sink.log(round, Event::CallPlaced { caller, callee });
            }
        }
        callers.len()
    }

    fn terminate(&mut self, sink: &mut dyn EventSink, round: Round, reached: usize) {
        let stalled_at = round.saturating_sub(1);
        let coverage = if reached == self.graph.node_count() {
            info!("All {} nodes were reached within {} round(s) of calling", reached, stalled_at);
            Coverage::Full {
                calling_rounds: stalled_at,
            }
        } else {
            info!(
                "Reached {} of {} nodes; growth stopped after round {}",
                reached,
                self.graph.node_count(),
                stalled_at
            );
            Coverage::Partial {
                reached,
                stalled_at,
            }
        };

        self.finish(sink, round, coverage, reached);
    }

    fn exhaust(&mut self, sink: &mut dyn EventSink, reached: usize) {
        let rounds = self.state.history.len();
        let coverage = if reached == self.graph.node_count() {
            info!(
                "All {} nodes were reached within {} round(s) of calling, at the iteration limit",
                reached,
                rounds - 1
            );
            Coverage::Full {
                calling_rounds: rounds - 1,
            }
        } else {
            info!(
                "Not all nodes were reached within {} iteration(s) ({} of {})",
                self.max_iteration,
                reached,
                self.graph.node_count()
            );
            Coverage::Inconclusive { reached, rounds }
        };

        self.finish(sink, rounds - 1, coverage, reached);
    }

    fn finish(&mut self, sink: &mut dyn EventSink, round: Round, coverage: Coverage, reached: usize) {
        sink.log(
            round,
            Event::Terminated {
                reached,
                rounds: self.state.history.len(),
            },
        );
        self.coverage = Some(coverage);
        self.phase = SimulationPhase::Terminated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ta_graph::RandomGraphBuilder;
    use crate::ta_interface::{NoOpSink, RecordingSink};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn path(nodes: usize) -> Graph {
        let samples: Vec<Vec<NodeId>> = (0..nodes)
            .map(|n| if n + 1 < nodes { vec![n + 1] } else { vec![] })
            .collect();
        Graph::from_samples(&samples)
    }

    fn run(graph: &Graph, calls: usize, max_iteration: usize, seeds: Vec<NodeId>) -> AvalancheRun {
        let mut rng = StdRng::seed_from_u64(17);
        AvalancheSimulator::new(graph, NeighborSampler::new(calls), max_iteration, seeds)
            .unwrap()
            .run(&mut rng, &mut NoOpSink)
    }

    fn reach_series(run: &AvalancheRun) -> Vec<usize> {
        run.state
            .history()
            .iter()
            .map(|row| row.iter().filter(|&&c| c > 0).count())
            .collect()
    }

    #[test]
    fn test_path_is_walked_one_hop_per_round() {
        let graph = path(4);
        let result = run(&graph, 1, 20, vec![0]);

        assert_eq!(reach_series(&result), vec![1, 2, 3, 4]);
        assert_eq!(result.coverage, Coverage::Full { calling_rounds: 3 });
        assert_eq!(result.state.called_by(1), &[0]);
        assert_eq!(result.state.called_by(2), &[1]);
        assert_eq!(result.state.called_by(3), &[2]);
        assert!(result.state.called_by(0).is_empty());
        assert!((0..4).all(|node| result.state.is_reached(node)));
        assert!(!result.state.is_reached(4));
    }

    #[test]
    fn test_star_from_leaf() {
        // center 0, leaves 1..=4
        let graph = Graph::from_samples(&[vec![1, 2, 3, 4], vec![], vec![], vec![], vec![]]);
        let result = run(&graph, 10, 20, vec![1]);

        assert_eq!(reach_series(&result), vec![1, 2, 5]);
        assert_eq!(result.state.history().len(), 3);
        assert_eq!(result.coverage, Coverage::Full { calling_rounds: 2 });
        // the center does not call back the leaf that informed it
        assert_eq!(result.state.call_count(), &[1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_partial_coverage_when_branch_is_skipped() {
        // 0 - 1, and 1 has two leaves 2 and 3; only one call per round
        let graph = Graph::from_samples(&[vec![1], vec![2, 3], vec![], vec![]]);
        let result = run(&graph, 1, 20, vec![0]);

        assert_eq!(reach_series(&result), vec![1, 2, 3]);
        assert_eq!(
            result.coverage,
            Coverage::Partial {
                reached: 3,
                stalled_at: 2
            }
        );
        assert_eq!(
            (0..4).filter(|&n| !result.state.is_reached(n)).count(),
            1
        );
    }

    #[test]
    fn test_co_called_nodes_accumulate() {
        let graph = Graph::from_samples(&[vec![2], vec![2], vec![]]);
        let result = run(&graph, 1, 20, vec![0, 1]);

        assert_eq!(result.state.history(), &[vec![1, 1, 0], vec![1, 1, 2]]);
        assert_eq!(result.state.called_by(2), &[0, 1]);
        assert!(result.coverage.is_full());
    }

    #[test]
    fn test_stagnant_round_calls_kept_in_final_counts() {
        // triangle: after round 1 everyone is reached, but 1 still calls 2 in round 2
        let graph = Graph::from_samples(&[vec![1, 2], vec![2], vec![]]);
        let result = run(&graph, 2, 20, vec![0]);

        assert_eq!(result.state.history(), &[vec![1, 0, 0], vec![1, 1, 1]]);
        assert_eq!(result.state.call_count(), &[1, 1, 2]);
        // 2 skips both 0 and 1, since 1 called it earlier in the same round
        assert_eq!(result.state.called_by(2), &[0, 1]);
        assert_eq!(result.state.called_by(0), &[] as &[NodeId]);
    }

    #[test]
    fn test_max_iteration_cuts_growth() {
        let graph = path(6);
        let result = run(&graph, 1, 3, vec![0]);

        assert_eq!(reach_series(&result), vec![1, 2, 3]);
        assert_eq!(
            result.coverage,
            Coverage::Inconclusive {
                reached: 3,
                rounds: 3
            }
        );
    }

    #[test]
    fn test_max_iteration_with_full_coverage() {
        let graph = path(3);
        let result = run(&graph, 1, 3, vec![0]);
        assert_eq!(result.coverage, Coverage::Full { calling_rounds: 2 });
        assert_eq!(result.state.history().len(), 3);
    }

    #[test]
    fn test_duplicate_seeds_count_once() {
        let graph = path(3);
        let result = run(&graph, 1, 10, vec![0, 0]);
        assert_eq!(result.state.history()[0], vec![1, 0, 0]);
    }

    #[test]
    fn test_multi_seed_initial_reach() {
        let builder = RandomGraphBuilder::new(10, 3);
        let graph = builder.build_connected(&mut StdRng::seed_from_u64(4)).unwrap();
        let single = run(&graph, 2, 10, vec![0]);
        let multi = run(&graph, 2, 10, vec![0, 1, 2]);

        assert_eq!(reach_series(&single)[0], 1);
        assert_eq!(reach_series(&multi)[0], 3);
    }

    #[test]
    fn test_step_phases() {
        let graph = path(3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = NoOpSink;
        let mut sim =
            AvalancheSimulator::new(&graph, NeighborSampler::new(1), 10, vec![0]).unwrap();

        assert_eq!(sim.phase(), SimulationPhase::Init);
        assert_eq!(sim.step(&mut rng, &mut sink), SimulationPhase::Seeding);
        assert_eq!(sim.step(&mut rng, &mut sink), SimulationPhase::Propagating);
        assert_eq!(sim.step(&mut rng, &mut sink), SimulationPhase::Propagating);
        assert!(sim.coverage().is_none());
        assert_eq!(sim.step(&mut rng, &mut sink), SimulationPhase::Terminated);
        assert_eq!(sim.coverage(), Some(Coverage::Full { calling_rounds: 2 }));

        // further steps are no-ops
        assert_eq!(sim.step(&mut rng, &mut sink), SimulationPhase::Terminated);
        assert_eq!(sim.round(), 3);
        assert_eq!(sim.state().history().len(), 3);
    }

    #[test]
    fn test_events_are_reported() {
        let graph = path(3);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = RecordingSink::default();
        AvalancheSimulator::new(&graph, NeighborSampler::new(1), 10, vec![0])
            .unwrap()
            .run(&mut rng, &mut sink);

        let calls: Vec<_> = sink
            .events
            .iter()
            .filter_map(|(round, e)| match e {
                Event::CallPlaced { caller, callee } => Some((*round, *caller, *callee)),
                _ => None,
            })
            .collect();
        assert_eq!(calls, vec![(1, 0, 1), (2, 1, 2)]);

        assert_eq!(
            sink.events.last(),
            Some(&(3, Event::Terminated { reached: 3, rounds: 3 }))
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let graph = path(3);
        let sampler = NeighborSampler::new(1);
        assert!(matches!(
            AvalancheSimulator::new(&graph, sampler, 10, vec![]),
            Err(ConfigError::NoStartNodes)
        ));
        assert!(matches!(
            AvalancheSimulator::new(&graph, sampler, 0, vec![0]),
            Err(ConfigError::NoIterations)
        ));
        assert!(matches!(
            AvalancheSimulator::new(&graph, sampler, 5, vec![3]),
            Err(ConfigError::StartNodeOutOfRange { node: 3, nodes: 3 })
        ));
    }

    proptest! {
        #[test]
        fn prop_avalanche_invariants(
            seed in any::<u64>(),
            nodes in 2usize..30,
            calls in 1usize..4,
            max_iteration in 1usize..15,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let edges_per_node = (nodes - 1).min(3);
            let graph = RandomGraphBuilder::new(nodes, edges_per_node)
                .build_connected(&mut rng)
                .unwrap();
            let result = AvalancheSimulator::new(&graph, NeighborSampler::new(calls), max_iteration, vec![0])
                .unwrap()
                .run(&mut rng, &mut NoOpSink);

            let reach = reach_series(&result);
            prop_assert!(!reach.is_empty());
            prop_assert!(reach.len() <= max_iteration);
            prop_assert_eq!(reach[0], 1);
            // strictly growing, since a non-growing round ends the run
            for pair in reach.windows(2) {
                prop_assert!(pair[1] > pair[0]);
            }

            match result.coverage {
                Coverage::Full { calling_rounds } => {
                    prop_assert_eq!(result.state.reached(), nodes);
                    prop_assert_eq!(calling_rounds + 1, reach.len());
                }
                Coverage::Partial { reached, stalled_at } => {
                    prop_assert!(reached < nodes);
                    prop_assert_eq!(stalled_at + 1, reach.len());
                }
                Coverage::Inconclusive { rounds, .. } => {
                    prop_assert_eq!(rounds, max_iteration);
                }
            }

            for node in 0..nodes {
                let callers = result.state.called_by(node);
                let unique: HashSet<_> = callers.iter().collect();
                prop_assert_eq!(unique.len(), callers.len());
                for caller in callers {
                    prop_assert!(graph.contains_edge(*caller, node));
                    prop_assert_ne!(*caller, node);
                }
            }
        }
    }
}
