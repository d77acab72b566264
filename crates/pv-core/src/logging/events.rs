//! Structured event names and stages for logging.
//!
//! Every solver event carries the run id and the stage it belongs to so
//! JSONL output can be grouped per Bellman backup.

use serde::{Deserialize, Serialize};

/// Phases of a value-iteration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Model and config loading, initial set construction.
    Init,
    Backproject,
    CrossSum,
    Prune,
    Union,
    Converged,
    /// Value and policy queries on a solution.
    Query,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Backproject => "backproject",
            Stage::CrossSum => "cross_sum",
            Stage::Prune => "prune",
            Stage::Union => "union",
            Stage::Converged => "converged",
            Stage::Query => "query",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/model loading
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const MODEL_LOADED: &str = "model.loaded";

    // Solver
    pub const SOLVE_STARTED: &str = "solve.started";
    pub const STAGE_FINISHED: &str = "solve.stage_finished";
    pub const ACTION_BACKED_UP: &str = "solve.action_backed_up";
    pub const SOLVE_FINISHED: &str = "solve.finished";

    // Queries
    pub const QUERY_ANSWERED: &str = "query.answered";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation ids shared by every event of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: String,
    /// Model file the run is solving, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
