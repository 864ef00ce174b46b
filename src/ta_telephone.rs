//! Telephone Avalanche facade
//!
//! `TelephoneAvalanche` builds a connected random graph and runs the full
//! simulation on construction. Everything afterwards is read-only.
//!
//! # Example
//! ```
//! use ta_rust::{AvalancheConfig, TelephoneAvalanche};
//!
//! let config = AvalancheConfig {
//!     nodes: 10,
//!     edges_per_node: 3,
//!     max_iteration: 10,
//!     calls_per_round: 2,
//!     seed: Some([7u8; 32]),
//!     ..Default::default()
//! };
//!
//! let avalanche = TelephoneAvalanche::new(config).unwrap();
//! assert_eq!(avalanche.reached_over_time()[0], 1);
//! assert_eq!(avalanche.max_over_time()[0], 1);
//! ```

use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Deserialize;

use crate::ta_avalanche::{AvalancheSimulator, CallState, Coverage};
use crate::ta_error::{AvalancheError, ConfigError};
use crate::ta_graph::{Graph, RandomGraphBuilder, DEFAULT_BUILD_ATTEMPTS, DEFAULT_SAMPLE_ATTEMPTS};
use crate::ta_history::{self, HistorySummary};
use crate::ta_interface::{CallCount, EventSink, NoOpSink, NodeId, Snapshot};
use crate::ta_layout::{GraphLayout, LayoutConfig};
use crate::ta_sampler::NeighborSampler;

// ============================================================================
// Configuration
// ============================================================================

/// Parameters for one avalanche run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AvalancheConfig {
    /// Number of nodes in the graph
    pub nodes: usize,

    /// Neighbors each node samples; actual degree is usually higher
    pub edges_per_node: usize,

    /// Upper bound on rounds, including the seeding round
    pub max_iteration: usize,

    /// Calls placed by each caller per round
    pub calls_per_round: usize,

    /// Nodes informed before the first calling round
    pub start_nodes: Vec<NodeId>,

    /// Whole-graph generations tried before giving up on connectivity
    pub max_build_attempts: usize,

    /// Draws per node before its neighbor sample is exhausted
    pub max_sample_attempts: usize,

    /// Random seed for reproducibility (None = draw from entropy)
    pub seed: Option<[u8; 32]>,
}

impl Default for AvalancheConfig {
    fn default() -> Self {
        Self {
            nodes: 100,
            edges_per_node: 3,
            max_iteration: 50,
            calls_per_round: 5,
            start_nodes: vec![0],
            max_build_attempts: DEFAULT_BUILD_ATTEMPTS,
            max_sample_attempts: DEFAULT_SAMPLE_ATTEMPTS,
            seed: None,
        }
    }
}

impl AvalancheConfig {
    /// Check the preconditions the graph builder and simulator rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if self.edges_per_node >= self.nodes {
            return Err(ConfigError::TooManyEdges {
                nodes: self.nodes,
                edges_per_node: self.edges_per_node,
            });
        }
        if self.edges_per_node == 0 && self.nodes > 1 {
            return Err(ConfigError::NoEdges);
        }
        if self.max_iteration == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.calls_per_round == 0 {
            return Err(ConfigError::NoCalls);
        }
        if self.start_nodes.is_empty() {
            return Err(ConfigError::NoStartNodes);
        }
        if let Some(&node) = self.start_nodes.iter().find(|&&n| n >= self.nodes) {
            return Err(ConfigError::StartNodeOutOfRange {
                node,
                nodes: self.nodes,
            });
        }
        if self.max_build_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("max_build_attempts"));
        }
        if self.max_sample_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("max_sample_attempts"));
        }
        Ok(())
    }

    /// Get or generate seed
    pub fn resolve_seed(&self) -> [u8; 32] {
        self.seed.unwrap_or_else(|| {
            let mut seed = [0u8; 32];
            StdRng::from_entropy().fill_bytes(&mut seed);
            seed
        })
    }
}

// ============================================================================
// Facade
// ============================================================================

/// A finished telephone avalanche: the graph it ran on and its call history
#[derive(Debug, Clone)]
pub struct TelephoneAvalanche {
    config: AvalancheConfig,
    seed_used: Option<[u8; 32]>,
    graph: Graph,
    state: CallState,
    coverage: Coverage,
}

impl TelephoneAvalanche {
    /// Build the graph and run the simulation with a `StdRng` seeded from the
    /// config (or from entropy).
    pub fn new(config: AvalancheConfig) -> Result<Self, AvalancheError> {
        let seed = config.resolve_seed();
        let mut rng = StdRng::from_seed(seed);
        let mut avalanche = Self::with_rng(config, &mut rng, &mut NoOpSink)?;
        avalanche.seed_used = Some(seed);
        Ok(avalanche)
    }

    /// Build and run with a caller-supplied random source and event sink
    pub fn with_rng<R: Rng + ?Sized>(
        config: AvalancheConfig,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> Result<Self, AvalancheError> {
        config.validate()?;

        let graph = RandomGraphBuilder::new(config.nodes, config.edges_per_node)
            .with_sample_attempts(config.max_sample_attempts)
            .with_build_attempts(config.max_build_attempts)
            .build_connected(rng)?;
        info!(
            "Built connected graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        let run = AvalancheSimulator::new(
            &graph,
            NeighborSampler::new(config.calls_per_round),
            config.max_iteration,
            config.start_nodes.clone(),
        )?
        .run(rng, sink);

        Ok(Self {
            config,
            seed_used: None,
            graph,
            state: run.state,
            coverage: run.coverage,
        })
    }

    pub fn config(&self) -> &AvalancheConfig {
        &self.config
    }

    /// Seed of the internal generator, when `new` created it
    pub fn seed_used(&self) -> Option<[u8; 32]> {
        self.seed_used
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    pub fn history(&self) -> &[Snapshot] {
        self.state.history()
    }

    pub fn outcome(&self) -> Coverage {
        self.coverage
    }

    pub fn max_over_time(&self) -> Vec<CallCount> {
        ta_history::max_over_time(self.history())
    }

    pub fn mean_over_time(&self) -> Vec<f64> {
        ta_history::mean_over_time(self.history())
    }

    pub fn reached_over_time(&self) -> Vec<usize> {
        ta_history::reached_over_time(self.history())
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary::from_history(self.history())
    }

    /// Force-directed layout of the graph
    pub fn layout(&self, config: &LayoutConfig) -> GraphLayout {
        GraphLayout::compute(&self.graph, config)
    }

    /// Draw the graph as an SVG file, reached nodes highlighted
    pub fn plot_graph<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        self.layout(&LayoutConfig::default())
            .write_svg(path, Some(self.state.call_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(nodes: usize, edges_per_node: usize, start_nodes: Vec<NodeId>) -> AvalancheConfig {
        AvalancheConfig {
            nodes,
            edges_per_node,
            max_iteration: 10,
            calls_per_round: 2,
            start_nodes,
            seed: Some([3u8; 32]),
            ..Default::default()
        }
    }

    #[test]
    fn test_ten_node_scenario() {
        let avalanche = TelephoneAvalanche::new(config(10, 3, vec![0])).unwrap();
        let reached = avalanche.reached_over_time();

        assert!(avalanche.graph().is_connected());
        assert_eq!(reached[0], 1);
        assert!(reached.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(avalanche.max_over_time()[0], 1);
        assert_eq!(avalanche.mean_over_time()[0], 0.1);
        assert_eq!(avalanche.history().len(), reached.len());

        match avalanche.outcome() {
            Coverage::Full { .. } => assert_eq!(*reached.last().unwrap(), 10),
            Coverage::Partial { reached: r, .. } => assert!(r < 10),
            Coverage::Inconclusive { rounds, .. } => assert_eq!(rounds, 10),
        }
    }

    #[test]
    fn test_multi_seed_scenario() {
        let avalanche = TelephoneAvalanche::new(config(10, 3, vec![0, 1, 2])).unwrap();
        assert_eq!(avalanche.reached_over_time()[0], 3);
    }

    #[test]
    fn test_disconnect_prone_input_still_connected() {
        for seed in 0..10u8 {
            let mut cfg = config(5, 1, vec![0]);
            cfg.seed = Some([seed; 32]);
            let avalanche = TelephoneAvalanche::new(cfg).unwrap();
            assert!(avalanche.graph().is_connected());
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = TelephoneAvalanche::new(config(40, 3, vec![0])).unwrap();
        let b = TelephoneAvalanche::new(config(40, 3, vec![0])).unwrap();
        assert_eq!(a.graph(), b.graph());
        assert_eq!(a.history(), b.history());
        assert_eq!(a.outcome(), b.outcome());
        assert_eq!(a.seed_used(), Some([3u8; 32]));
    }

    #[test]
    fn test_queries_are_idempotent() {
        let avalanche = TelephoneAvalanche::new(config(20, 3, vec![0])).unwrap();
        assert_eq!(avalanche.max_over_time(), avalanche.max_over_time());
        assert_eq!(avalanche.mean_over_time(), avalanche.mean_over_time());
        assert_eq!(avalanche.reached_over_time(), avalanche.reached_over_time());
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            (config(0, 0, vec![0]), ConfigError::NoNodes),
            (
                config(5, 5, vec![0]),
                ConfigError::TooManyEdges {
                    nodes: 5,
                    edges_per_node: 5,
                },
            ),
            (config(5, 0, vec![0]), ConfigError::NoEdges),
            (config(5, 2, vec![]), ConfigError::NoStartNodes),
            (
                config(5, 2, vec![1, 5]),
                ConfigError::StartNodeOutOfRange { node: 5, nodes: 5 },
            ),
        ];

        for (cfg, expected) in cases {
            assert_eq!(
                TelephoneAvalanche::new(cfg).unwrap_err(),
                AvalancheError::Config(expected)
            );
        }

        let mut cfg = config(5, 2, vec![0]);
        cfg.calls_per_round = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoCalls));
        cfg.calls_per_round = 1;
        cfg.max_iteration = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoIterations));
    }

    #[test]
    fn test_single_node_graph() {
        let avalanche = TelephoneAvalanche::new(config(1, 0, vec![0])).unwrap();
        assert_eq!(avalanche.reached_over_time(), vec![1]);
        assert_eq!(avalanche.outcome(), Coverage::Full { calling_rounds: 0 });
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = "nodes: 12\nedges_per_node: 2\nmax_iteration: 8\nstart_nodes: [0, 3]\n";
        let cfg: AvalancheConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.nodes, 12);
        assert_eq!(cfg.start_nodes, vec![0, 3]);
        assert_eq!(cfg.calls_per_round, 5);
        assert_eq!(cfg.seed, None);
        assert!(cfg.validate().is_ok());
    }
}
