//! Scenario runner

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ta_rust::ta_history::{self, HistorySummary};
use ta_rust::TelephoneAvalanche;

use super::config::ScenarioFile;
use super::event_sinks::ConsoleEventSink;
use super::stats::{SweepResult, TrialResult};

/// Runs every trial of one scenario
pub struct ScenarioRunner {
    name: String,
    scenario: ScenarioFile,
    master_seed: [u8; 32],
}

impl ScenarioRunner {
    /// `seed` overrides the scenario's own seed; with neither, one is drawn
    /// from entropy
    pub fn new(name: String, scenario: ScenarioFile, seed: Option<[u8; 32]>) -> Self {
        let master_seed = seed.unwrap_or_else(|| scenario.config.resolve_seed());
        Self {
            name,
            scenario,
            master_seed,
        }
    }

    /// Run all trials
    pub fn run(self) -> SweepResult {
        let mut seeds = StdRng::from_seed(self.master_seed);
        let mut sink = ConsoleEventSink::new(self.scenario.verbose);
        let mut trials = Vec::with_capacity(self.scenario.trials);
        let mut failures = Vec::new();
        let mut outputs_written = false;

        for trial in 0..self.scenario.trials {
            let seed: [u8; 32] = seeds.gen();
            let mut config = self.scenario.config.clone();
            config.seed = Some(seed);

            let mut rng = StdRng::from_seed(seed);
            let avalanche = match TelephoneAvalanche::with_rng(config, &mut rng, &mut sink) {
                Ok(avalanche) => avalanche,
                Err(e) => {
                    warn!("Trial {} failed: {}", trial, e);
                    failures.push((trial, e.to_string()));
                    continue;
                }
            };

            if !outputs_written {
                self.write_outputs(&avalanche);
                outputs_written = true;
            }

            info!("Trial {}: {:?}", trial, avalanche.outcome());
            trials.push(TrialResult {
                trial,
                seed,
                coverage: avalanche.outcome(),
                summary: HistorySummary::from_history(avalanche.history()),
                reached_over_time: avalanche.reached_over_time(),
            });
        }

        SweepResult {
            name: self.name,
            seed_used: self.master_seed,
            trials,
            failures,
        }
    }

    fn write_outputs(&self, avalanche: &TelephoneAvalanche) {
        if let Some(ref path) = self.scenario.output.csv_path {
            match ta_history::export_history_csv(path, avalanche.history()) {
                Ok(()) => info!("History written to {}", path.display()),
                Err(e) => warn!("Failed to write {}: {}", path.display(), e),
            }
        }
        if let Some(ref path) = self.scenario.output.svg_path {
            match avalanche.plot_graph(path) {
                Ok(()) => info!("Graph drawing written to {}", path.display()),
                Err(e) => warn!("Failed to write {}: {}", path.display(), e),
            }
        }
    }
}
