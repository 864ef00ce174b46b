//! Scenario file format

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use ta_rust::AvalancheConfig;
use thiserror::Error;

/// One scenario, as loaded from YAML
#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    pub meta: ScenarioMeta,

    /// Avalanche parameters; unset fields keep their defaults
    pub config: AvalancheConfig,

    /// Independent runs, each with its own derived seed
    #[serde(default = "default_trials")]
    pub trials: usize,

    /// Debug-level logging and per-call console output
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
}

/// Files written for the first trial that succeeds
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Per-round history as CSV
    pub csv_path: Option<PathBuf>,

    /// Graph drawing as SVG
    pub svg_path: Option<PathBuf>,
}

fn default_trials() -> usize {
    1
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl ScenarioFile {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let yaml_content = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&yaml_content).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Display name: the meta name, else the file stem
    pub fn display_name(&self, path: &Path) -> String {
        self.meta.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scenario".to_string())
        })
    }
}
