//! Random Graph Construction
//!
//! Builds the undirected graph the avalanche runs on. Every node draws a random
//! sample of `edges_per_node` other nodes; the per-node samples are merged into a
//! symmetric adjacency structure, so a node usually ends up with more than
//! `edges_per_node` neighbors.
//!
//! A graph is only handed to the simulator once it is connected. A disconnected
//! graph is discarded as a whole and regenerated, up to `max_build_attempts`
//! times.

use std::collections::VecDeque;

use indexmap::IndexSet;
use log::{debug, warn};
use rand::seq::index;
use rand::Rng;

use crate::ta_error::{GraphError, SampleError};
use crate::ta_interface::NodeId;

/// Draws tried per node before a sample is declared exhausted
pub const DEFAULT_SAMPLE_ATTEMPTS: usize = 100;

/// Whole-graph generations tried before giving up on connectivity
pub const DEFAULT_BUILD_ATTEMPTS: usize = 1000;

// ============================================================================
// Graph
// ============================================================================

/// Undirected simple graph over the nodes `0..node_count`
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    adjacency: Vec<IndexSet<NodeId>>,
}

impl Graph {
    /// Graph with `nodes` nodes and no edges
    pub fn empty(nodes: usize) -> Self {
        Self {
            adjacency: vec![IndexSet::new(); nodes],
        }
    }

    /// Merge directed per-node samples into an undirected graph.
    ///
    /// `samples[u]` lists the nodes `u` picked. An edge `u - v` exists if `v` is
    /// in `u`'s sample or `u` is in `v`'s. Self-loops and out-of-range entries are
    /// dropped. Neighbor sets are sorted so iteration order only depends on the
    /// edge set.
    pub fn from_samples(samples: &[Vec<NodeId>]) -> Self {
        let mut graph = Self::empty(samples.len());
        for (u, picked) in samples.iter().enumerate() {
            for &v in picked {
                graph.add_edge(u, v);
            }
        }
        for neighbors in &mut graph.adjacency {
            neighbors.sort();
        }
        graph
    }

    /// Add the undirected edge `u - v`. Returns false for self-loops,
    /// unknown nodes and edges that already exist.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        if u == v || u >= self.node_count() || v >= self.node_count() {
            return false;
        }
        let inserted = self.adjacency[u].insert(v);
        self.adjacency[v].insert(u);
        inserted
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(IndexSet::len).sum::<usize>() / 2
    }

    /// Neighbors of `node`, or `None` if the node does not exist
    pub fn neighbors(&self, node: NodeId) -> Option<&IndexSet<NodeId>> {
        self.adjacency.get(node)
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency.get(node).map_or(0, IndexSet::len)
    }

    pub fn contains_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.adjacency
            .get(u)
            .map_or(false, |neighbors| neighbors.contains(&v))
    }

    /// Every edge once, as `(low, high)` pairs in ascending order
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (u, neighbors) in self.adjacency.iter().enumerate() {
            for &v in neighbors {
                if u < v {
                    edges.push((u, v));
                }
            }
        }
        edges.sort_unstable();
        edges
    }

    /// Number of nodes reachable from `start` (including `start`)
    pub fn reachable_from(&self, start: NodeId) -> usize {
        if start >= self.node_count() {
            return 0;
        }

        let mut visited = vec![false; self.node_count()];
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);
        let mut count = 1;

        while let Some(node) = queue.pop_front() {
            for &next in &self.adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    count += 1;
                    queue.push_back(next);
                }
            }
        }
        count
    }

    /// True if every node can reach every other node. The empty graph counts
    /// as connected.
    pub fn is_connected(&self) -> bool {
        self.node_count() == 0 || self.reachable_from(0) == self.node_count()
    }
}

// ============================================================================
// Exclusive Sampling
// ============================================================================

/// Draw `amount` distinct values from `0..pool_size` that do not include
/// `excluded`.
///
/// `excluded` is taken out of the pool before drawing, so a draw only needs
/// repeating if it still contains `excluded`. After `max_attempts` such draws
/// the sample is exhausted.
pub fn exclusive_sample<R: Rng + ?Sized>(
    rng: &mut R,
    excluded: NodeId,
    pool_size: usize,
    amount: usize,
    max_attempts: usize,
) -> Result<Vec<NodeId>, SampleError> {
    let in_pool = excluded < pool_size;
    let available = if in_pool { pool_size - 1 } else { pool_size };
    if amount > available {
        return Err(SampleError::PoolTooSmall {
            requested: amount,
            available,
        });
    }

    for _ in 0..max_attempts {
        let sample: Vec<NodeId> = index::sample(rng, available, amount)
            .into_iter()
            .map(|i| if in_pool && i >= excluded { i + 1 } else { i })
            .collect();
        if !sample.contains(&excluded) {
            return Ok(sample);
        }
    }

    Err(SampleError::Exhausted {
        node: excluded,
        attempts: max_attempts,
    })
}

// ============================================================================
// Builder
// ============================================================================

/// Generates random graphs and retries until one is connected
#[derive(Debug, Clone)]
pub struct RandomGraphBuilder {
    nodes: usize,
    edges_per_node: usize,
    max_sample_attempts: usize,
    max_build_attempts: usize,
}

impl RandomGraphBuilder {
    pub fn new(nodes: usize, edges_per_node: usize) -> Self {
        Self {
            nodes,
            edges_per_node,
            max_sample_attempts: DEFAULT_SAMPLE_ATTEMPTS,
            max_build_attempts: DEFAULT_BUILD_ATTEMPTS,
        }
    }

    pub fn with_sample_attempts(mut self, attempts: usize) -> Self {
        self.max_sample_attempts = attempts;
        self
    }

    pub fn with_build_attempts(mut self, attempts: usize) -> Self {
        self.max_build_attempts = attempts;
        self
    }

    /// One generation attempt. The result may be disconnected.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Graph, SampleError> {
        let samples = (0..self.nodes)
            .map(|node| {
                exclusive_sample(
                    rng,
                    node,
                    self.nodes,
                    self.edges_per_node,
                    self.max_sample_attempts,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Graph::from_samples(&samples))
    }

    /// Generate graphs until one is connected.
    ///
    /// Both disconnected graphs and exhausted samples discard the attempt and
    /// start over from scratch.
    pub fn build_connected<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Graph, GraphError> {
        let mut last_sample_error = None;
        let mut built_any = false;

        for attempt in 1..=self.max_build_attempts {
            match self.build(rng) {
                Ok(graph) if graph.is_connected() => {
                    debug!(
                        "Connected graph after {} attempt(s): {} nodes, {} edges",
                        attempt,
                        graph.node_count(),
                        graph.edge_count()
                    );
                    return Ok(graph);
                }
                Ok(graph) => {
                    built_any = true;
                    debug!(
                        "Attempt {}: graph disconnected ({} of {} nodes reachable), regenerating",
                        attempt,
                        graph.reachable_from(0),
                        graph.node_count()
                    );
                }
                Err(e) => {
                    warn!("Attempt {}: {}, regenerating", attempt, e);
                    last_sample_error = Some(e);
                }
            }
        }

        match last_sample_error {
            Some(e) if !built_any => Err(GraphError::Sample(e)),
            _ => Err(GraphError::Disconnected {
                attempts: self.max_build_attempts,
            }),
        }
    }
}
