//! Results of a scenario sweep

use ta_rust::ta_history::HistorySummary;
use ta_rust::Coverage;

/// Outcome of one trial
#[derive(Debug, Clone)]
pub struct TrialResult {
    /// Trial index within the sweep
    pub trial: usize,

    /// Seed the trial ran with
    pub seed: [u8; 32],

    pub coverage: Coverage,

    pub summary: HistorySummary,

    /// Reached nodes per round
    pub reached_over_time: Vec<usize>,
}

/// All trials of one scenario
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub name: String,

    /// Master seed the trial seeds were derived from
    pub seed_used: [u8; 32],

    pub trials: Vec<TrialResult>,

    /// Trials that could not run, with the reason
    pub failures: Vec<(usize, String)>,
}

impl SweepResult {
    pub fn full_coverage_count(&self) -> usize {
        self.trials.iter().filter(|t| t.coverage.is_full()).count()
    }

    /// Fraction of successful trials that reached every node
    pub fn full_coverage_rate(&self) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        self.full_coverage_count() as f64 / self.trials.len() as f64
    }

    /// Mean calling rounds over the fully covered trials
    pub fn mean_calling_rounds(&self) -> Option<f64> {
        let rounds: Vec<usize> = self
            .trials
            .iter()
            .filter_map(|t| match t.coverage {
                Coverage::Full { calling_rounds } => Some(calling_rounds),
                _ => None,
            })
            .collect();
        if rounds.is_empty() {
            return None;
        }
        Some(rounds.iter().sum::<usize>() as f64 / rounds.len() as f64)
    }

    /// Mean fraction of nodes reached per trial
    pub fn mean_coverage_fraction(&self) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        self.trials
            .iter()
            .map(|t| t.summary.coverage_fraction())
            .sum::<f64>()
            / self.trials.len() as f64
    }

    pub fn stalled_count(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| matches!(t.coverage, Coverage::Partial { .. }))
            .count()
    }

    pub fn inconclusive_count(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| matches!(t.coverage, Coverage::Inconclusive { .. }))
            .count()
    }

    /// Print a summary of the sweep
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Telephone Avalanche Results                    ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Scenario: {}", self.name);
        println!("  Master seed: 0x{}", seed_hex(&self.seed_used));
        println!("  Trials: {} ({} failed)\n", self.trials.len() + self.failures.len(), self.failures.len());

        if self.trials.len() <= 10 {
            println!("Trials:");
            for t in &self.trials {
                println!(
                    "  #{:<3} seed={}.. {:<40} rounds={} peak={} reach={:?}",
                    t.trial,
                    &seed_hex(&t.seed)[..8],
                    describe(&t.coverage),
                    t.summary.rounds,
                    t.summary.peak_calls,
                    t.reached_over_time
                );
            }
            println!();
        }

        println!("Coverage:");
        println!(
            "  Full: {} ({:.1}%)",
            self.full_coverage_count(),
            self.full_coverage_rate() * 100.0
        );
        println!("  Stalled: {}", self.stalled_count());
        println!("  Inconclusive: {}", self.inconclusive_count());
        println!(
            "  Mean reached: {:.1}%",
            self.mean_coverage_fraction() * 100.0
        );
        if let Some(mean) = self.mean_calling_rounds() {
            println!("  Mean calling rounds to full coverage: {:.2}", mean);
        }

        for (trial, reason) in &self.failures {
            println!("  Trial #{} failed: {}", trial, reason);
        }
        println!();
    }
}

fn describe(coverage: &Coverage) -> String {
    match coverage {
        Coverage::Full { calling_rounds } => format!("full after {} round(s)", calling_rounds),
        Coverage::Partial {
            reached,
            stalled_at,
        } => format!("stalled at round {} ({} reached)", stalled_at, reached),
        Coverage::Inconclusive { reached, rounds } => {
            format!("still growing after {} ({} reached)", rounds, reached)
        }
    }
}

pub fn seed_hex(seed: &[u8; 32]) -> String {
    seed.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(trial: usize, coverage: Coverage, history: Vec<Vec<u32>>) -> TrialResult {
        TrialResult {
            trial,
            seed: [0u8; 32],
            coverage,
            summary: HistorySummary::from_history(&history),
            reached_over_time: ta_rust::ta_history::reached_over_time(&history),
        }
    }

    #[test]
    fn test_aggregates() {
        let sweep = SweepResult {
            name: "test".to_string(),
            seed_used: [0u8; 32],
            trials: vec![
                trial(0, Coverage::Full { calling_rounds: 2 }, vec![vec![1, 0], vec![1, 1]]),
                trial(1, Coverage::Full { calling_rounds: 4 }, vec![vec![1, 0], vec![1, 2]]),
                trial(
                    2,
                    Coverage::Partial {
                        reached: 1,
                        stalled_at: 0,
                    },
                    vec![vec![1, 0]],
                ),
                trial(3, Coverage::Inconclusive { reached: 1, rounds: 1 }, vec![vec![1, 0]]),
            ],
            failures: vec![],
        };

        assert_eq!(sweep.full_coverage_count(), 2);
        assert_eq!(sweep.full_coverage_rate(), 0.5);
        assert_eq!(sweep.mean_calling_rounds(), Some(3.0));
        assert_eq!(sweep.mean_coverage_fraction(), 0.75);
        assert_eq!(sweep.stalled_count(), 1);
        assert_eq!(sweep.inconclusive_count(), 1);
    }

    #[test]
    fn test_empty_sweep() {
        let sweep = SweepResult {
            name: "empty".to_string(),
            seed_used: [0u8; 32],
            trials: vec![],
            failures: vec![(0, "invalid".to_string())],
        };
        assert_eq!(sweep.full_coverage_rate(), 0.0);
        assert_eq!(sweep.mean_calling_rounds(), None);
        assert_eq!(sweep.mean_coverage_fraction(), 0.0);
    }

    #[test]
    fn test_seed_hex() {
        let mut seed = [0u8; 32];
        seed[0] = 0xab;
        assert!(seed_hex(&seed).starts_with("ab00"));
        assert_eq!(seed_hex(&seed).len(), 64);
    }
}
