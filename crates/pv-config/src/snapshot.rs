//! Configuration snapshots for solver output and reproducibility.
//!
//! A snapshot captures the exact configuration a run was started with, so a
//! solution can be traced back to its settings.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigSource;
use crate::solver::SolverConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// SHA-256 of the solver.json content (None for built-in defaults).
    #[serde(default)]
    pub config_hash: Option<String>,

    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    pub summary: ConfigSummary,
}

/// Key configuration values for quick reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub tolerance: f64,
    pub max_stages: u32,
    pub time_limit_secs: Option<f64>,
    pub track_policy_graph: bool,
    pub prune_across_actions: bool,
    pub parallel: bool,
    pub probe_count: usize,
}

impl From<&SolverConfig> for ConfigSummary {
    fn from(cfg: &SolverConfig) -> Self {
        Self {
            tolerance: cfg.tolerance,
            max_stages: cfg.max_stages,
            time_limit_secs: cfg.time_limit_secs,
            track_policy_graph: cfg.track_policy_graph,
            prune_across_actions: cfg.prune_across_actions,
            parallel: cfg.parallel,
            probe_count: cfg.probe_beliefs.len(),
        }
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot from loaded configuration.
    pub fn new(
        solver: &SolverConfig,
        path: Option<&Path>,
        source: ConfigSource,
        raw_json: Option<&str>,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: solver.schema_version.clone(),
            config_hash: raw_json.map(hash_content),
            config_path: path.map(|p| p.display().to_string()),
            source: source.to_string(),
            summary: ConfigSummary::from(solver),
        }
    }

    /// Whether two snapshots were taken from identical config content.
    pub fn same_content(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }
}

/// Hex-encoded SHA-256 of `content`.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
