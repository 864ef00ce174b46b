//! Per-round aggregates over a recorded call history.
//!
//! All functions are pure and keep round order; an empty history yields empty
//! series.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ta_interface::{CallCount, Snapshot};

/// Highest call count of any node, per round
pub fn max_over_time(history: &[Snapshot]) -> Vec<CallCount> {
    history
        .iter()
        .map(|row| row.iter().copied().max().unwrap_or(0))
        .collect()
}

/// Mean call count across all nodes, per round
pub fn mean_over_time(history: &[Snapshot]) -> Vec<f64> {
    history
        .iter()
        .map(|row| {
            if row.is_empty() {
                0.0
            } else {
                row.iter().map(|&c| c as f64).sum::<f64>() / row.len() as f64
            }
        })
        .collect()
}

/// Number of nodes with a positive call count, per round
pub fn reached_over_time(history: &[Snapshot]) -> Vec<usize> {
    history
        .iter()
        .map(|row| row.iter().filter(|&&c| c > 0).count())
        .collect()
}

/// Headline numbers for a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    /// Rounds kept in the history
    pub rounds: usize,

    /// Nodes reached in the last kept round
    pub final_reached: usize,

    /// Total node count
    pub nodes: usize,

    /// Highest call count any node had in any kept round
    pub peak_calls: CallCount,

    /// Mean call count in the last kept round
    pub final_mean_calls: f64,
}

impl HistorySummary {
    pub fn from_history(history: &[Snapshot]) -> Self {
        Self {
            rounds: history.len(),
            final_reached: reached_over_time(history).last().copied().unwrap_or(0),
            nodes: history.first().map_or(0, Vec::len),
            peak_calls: max_over_time(history).into_iter().max().unwrap_or(0),
            final_mean_calls: mean_over_time(history).last().copied().unwrap_or(0.0),
        }
    }

    /// Fraction of nodes reached, 0.0 to 1.0
    pub fn coverage_fraction(&self) -> f64 {
        if self.nodes == 0 {
            0.0
        } else {
            self.final_reached as f64 / self.nodes as f64
        }
    }
}

/// Write one CSV row per round: `round,reached,max_calls,mean_calls`
pub fn write_history_csv<W: Write>(writer: &mut W, history: &[Snapshot]) -> std::io::Result<()> {
    writeln!(writer, "round,reached,max_calls,mean_calls")?;

    let reached = reached_over_time(history);
    let max = max_over_time(history);
    let mean = mean_over_time(history);
    for round in 0..history.len() {
        writeln!(
            writer,
            "{},{},{},{:.4}",
            round, reached[round], max[round], mean[round]
        )?;
    }
    Ok(())
}

/// `write_history_csv` into a new file at `path`
pub fn export_history_csv<P: AsRef<Path>>(path: P, history: &[Snapshot]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_history_csv(&mut writer, history)?;
    writer.flush()
}
