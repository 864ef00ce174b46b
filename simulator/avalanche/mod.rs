//! Scenario simulator module
//!
//! Runs a telephone avalanche scenario several times with seeds derived from
//! one master seed and aggregates the outcomes:
//! - how often every node was reached
//! - how many calling rounds full coverage took
//! - how much of the graph partial runs covered

pub mod config;
pub mod event_sinks;
pub mod runner;
pub mod stats;

pub use config::ScenarioFile;
pub use runner::ScenarioRunner;
