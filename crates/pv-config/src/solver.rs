//! Value-iteration solver settings (solver.json).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Solver configuration.
///
/// Every field except `schema_version` may be omitted from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Stop once the value change between stages is at most this.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Hard cap on Bellman backups.
    #[serde(default = "default_max_stages")]
    pub max_stages: u32,

    /// Wall-clock budget in seconds.
    #[serde(default)]
    pub time_limit_secs: Option<f64>,

    /// Record per-observation successors so a policy graph can be built.
    #[serde(default = "default_true")]
    pub track_policy_graph: bool,

    /// Prune dominated elements across actions after the union step.
    #[serde(default)]
    pub prune_across_actions: bool,

    /// Back up actions on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Extra beliefs at which the stage residual is measured.
    #[serde(default)]
    pub probe_beliefs: Vec<Vec<f64>>,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_stages() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            tolerance: default_tolerance(),
            max_stages: default_max_stages(),
            time_limit_secs: None,
            track_policy_graph: true,
            prune_across_actions: false,
            parallel: true,
            probe_beliefs: Vec::new(),
        }
    }
}

impl SolverConfig {
    /// Wall-clock budget, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs_f64)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_stages(mut self, max_stages: u32) -> Self {
        self.max_stages = max_stages;
        self
    }

    pub fn with_policy_graph(mut self, enabled: bool) -> Self {
        self.track_policy_graph = enabled;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_prune_across_actions(mut self, enabled: bool) -> Self {
        self.prune_across_actions = enabled;
        self
    }
}
