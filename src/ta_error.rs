//! Error types for graph construction, configuration and simulation.

use thiserror::Error;

use crate::ta_interface::NodeId;

/// Failure of the exclusive sampling used while building a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    /// Every draw still contained the excluded node
    #[error("no sample without node {node} found after {attempts} attempt(s)")]
    Exhausted { node: NodeId, attempts: usize },

    /// More values requested than the pool can provide
    #[error("cannot draw {requested} distinct values from a pool of {available}")]
    PoolTooSmall { requested: usize, available: usize },
}

/// Failure to produce a connected random graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// No connected graph within the attempt cap
    #[error("graph still disconnected after {attempts} build attempt(s)")]
    Disconnected { attempts: usize },
}

/// Precondition violations in an `AvalancheConfig`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("graph needs at least one node")]
    NoNodes,

    #[error("edges_per_node ({edges_per_node}) must be smaller than nodes ({nodes})")]
    TooManyEdges { nodes: usize, edges_per_node: usize },

    #[error("edges_per_node must be positive when there is more than one node")]
    NoEdges,

    #[error("max_iteration must be positive")]
    NoIterations,

    #[error("calls_per_round must be positive")]
    NoCalls,

    #[error("at least one start node is required")]
    NoStartNodes,

    #[error("start node {node} is outside 0..{nodes}")]
    StartNodeOutOfRange { node: NodeId, nodes: usize },

    #[error("{0} must be positive")]
    ZeroAttempts(&'static str),
}

/// Top-level error returned by `TelephoneAvalanche`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvalancheError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),
}
