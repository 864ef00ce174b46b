//! # ta_rust - Telephone Avalanche Simulation
//!
//! Simulates how a piece of news spreads through a phone tree. A connected
//! random graph is generated, one or more seed nodes start calling a bounded
//! number of neighbors, and every newly informed node calls onward in the next
//! round until the number of informed nodes stops growing.
//!
//! ## Core Components
//!
//! - **RandomGraphBuilder**: random graph generation, retried until connected
//! - **NeighborSampler**: picks who a caller dials in one round
//! - **AvalancheSimulator**: round loop, call counts, caller bookkeeping and
//!   termination
//! - **History analytics**: per-round max / mean / reach series
//! - **GraphLayout**: force-directed drawing of the finished graph
//!
//! ## Usage
//!
//! ```no_run
//! use ta_rust::{AvalancheConfig, TelephoneAvalanche};
//!
//! let avalanche = TelephoneAvalanche::new(AvalancheConfig {
//!     nodes: 200,
//!     edges_per_node: 4,
//!     max_iteration: 30,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! println!("{:?}", avalanche.outcome());
//! println!("{:?}", avalanche.reached_over_time());
//! avalanche.plot_graph("graph.svg").unwrap();
//! ```
//!
//! Randomness is always injectable: `TelephoneAvalanche::with_rng` and the
//! lower-level components take any `rand::Rng`.

pub mod ta_avalanche;
pub mod ta_error;
pub mod ta_graph;
pub mod ta_history;
pub mod ta_interface;
pub mod ta_layout;
pub mod ta_sampler;
pub mod ta_telephone;

// Re-export commonly used types
pub use ta_avalanche::{AvalancheRun, AvalancheSimulator, CallState, Coverage, SimulationPhase};
pub use ta_error::{AvalancheError, ConfigError, GraphError, SampleError};
pub use ta_graph::{Graph, RandomGraphBuilder};
pub use ta_interface::{CallCount, Event, EventSink, NoOpSink, NodeId, RecordingSink, Round, Snapshot};
pub use ta_layout::{GraphLayout, LayoutConfig};
pub use ta_sampler::NeighborSampler;
pub use ta_telephone::{AvalancheConfig, TelephoneAvalanche};
