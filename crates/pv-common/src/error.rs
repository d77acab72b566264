//! Error types for the value-iteration engine.
//!
//! Every error carries:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A recoverability hint and a remediation string for humans
//!
//! Errors serialize to structured JSON for the CLI:
//! ```json
//! {
//!   "code": 22,
//!   "category": "model",
//!   "message": "invalid model: transitions for (state 1, action 0) sum to 0.9",
//!   "recoverable": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Solver configuration errors.
    Config,
    /// POMDP model loading and validation errors.
    Model,
    /// Value iteration and query errors.
    Solver,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Solver => write!(f, "solver"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid solver configuration: {0}")]
    InvalidSolverConfig(String),

    #[error("schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersion { expected: String, actual: String },

    // Model errors (20-29)
    #[error("model error: {0}")]
    Model(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: String },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    // Solver errors (30-39)
    #[error("solver error: {0}")]
    Solver(String),

    #[error("value function is empty; no optimum is defined")]
    EmptyValueFunction,

    #[error("no action is feasible at the queried belief")]
    NoFeasibleAction,

    #[error("policy graph was not tracked for this solution")]
    PolicyGraphUnavailable,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Model errors
    /// - 30-39: Solver errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSolverConfig(_) => 11,
            Error::SchemaVersion { .. } => 12,
            Error::Model(_) => 20,
            Error::ModelNotFound { .. } => 21,
            Error::InvalidModel(_) => 22,
            Error::Solver(_) => 30,
            Error::EmptyValueFunction => 31,
            Error::NoFeasibleAction => 32,
            Error::PolicyGraphUnavailable => 33,
            Error::InvalidQuery(_) => 34,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidSolverConfig(_) | Error::SchemaVersion { .. } => {
                ErrorCategory::Config
            }

            Error::Model(_) | Error::ModelNotFound { .. } | Error::InvalidModel(_) => {
                ErrorCategory::Model
            }

            Error::Solver(_)
            | Error::EmptyValueFunction
            | Error::NoFeasibleAction
            | Error::PolicyGraphUnavailable
            | Error::InvalidQuery(_) => ErrorCategory::Solver,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable by the caller.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidSolverConfig(_) => true,
            Error::SchemaVersion { .. } => true,

            Error::Model(_) => true,
            Error::ModelNotFound { .. } => true,
            Error::InvalidModel(_) => true,

            Error::Solver(_) => false,
            Error::EmptyValueFunction => false,
            Error::NoFeasibleAction => true,
            Error::PolicyGraphUnavailable => true,
            Error::InvalidQuery(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidSolverConfig(_) => {
                "Run 'pv-core check --config <file>' to validate the solver configuration."
            }
            Error::SchemaVersion { .. } => {
                "Update the configuration file's schema_version to the version this build expects."
            }
            Error::Model(_) | Error::InvalidModel(_) => {
                "Run 'pv-core check --model <file>' to locate the offending transition or reward entry."
            }
            Error::ModelNotFound { .. } => "Check the --model path.",
            Error::Solver(_) => "Internal solver failure. Re-run with PV_LOG=debug and report it.",
            Error::EmptyValueFunction => {
                "The value function has no elements. Check that the model has at least one available action."
            }
            Error::NoFeasibleAction => {
                "No action is available at any state in the belief's support. Check action availability in the model."
            }
            Error::PolicyGraphUnavailable => {
                "Enable track_policy_graph in the solver configuration."
            }
            Error::InvalidQuery(_) => {
                "Beliefs must be distributions over the model's states; weights need one entry per objective."
            }
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidSolverConfig(_) => "Invalid Solver Configuration",
            Error::SchemaVersion { .. } => "Schema Version Mismatch",
            Error::Model(_) => "Model Error",
            Error::ModelNotFound { .. } => "Model Not Found",
            Error::InvalidModel(_) => "Invalid Model",
            Error::Solver(_) => "Solver Error",
            Error::EmptyValueFunction => "Empty Value Function",
            Error::NoFeasibleAction => "No Feasible Action",
            Error::PolicyGraphUnavailable => "Policy Graph Unavailable",
            Error::InvalidQuery(_) => "Invalid Query",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Remediation hint.
    pub remediation: String,

    /// Additional structured context (e.g., file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::ModelNotFound { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::SchemaVersion { expected, actual } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Human-facing rendering: headline, reason, fix.
    pub fn to_human(&self, headline: &str) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            headline, self.message, self.remediation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_category_ranges() {
        let cases = [
            (Error::Config("x".into()), ErrorCategory::Config, 10..20),
            (Error::InvalidModel("x".into()), ErrorCategory::Model, 20..30),
            (Error::EmptyValueFunction, ErrorCategory::Solver, 30..40),
            (Error::PolicyGraphUnavailable, ErrorCategory::Solver, 30..40),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                ErrorCategory::Io,
                60..70,
            ),
        ];
        for (err, category, range) in cases {
            assert_eq!(err.category(), category);
            assert!(range.contains(&err.code()), "{} not in {:?}", err.code(), range);
        }
    }

    #[test]
    fn empty_set_and_infeasibility_are_distinct() {
        let empty = Error::EmptyValueFunction;
        let infeasible = Error::NoFeasibleAction;
        assert_ne!(empty.code(), infeasible.code());
        assert!(!empty.is_recoverable());
        assert!(infeasible.is_recoverable());
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::ModelNotFound {
            path: "/tmp/missing.json".to_string(),
        };
        let structured = StructuredError::from(&err).with_context("stage", 3);
        assert_eq!(structured.code, 21);
        assert_eq!(structured.category, ErrorCategory::Model);
        assert_eq!(structured.context["path"], "/tmp/missing.json");
        assert_eq!(structured.context["stage"], 3);

        let json = structured.to_json();
        assert!(json.contains("\"category\":\"model\""));
    }

    #[test]
    fn human_rendering_has_fix_line() {
        let err = Error::NoFeasibleAction;
        let rendered = StructuredError::from(&err).to_human(err.headline());
        assert!(rendered.starts_with("✗ No Feasible Action"));
        assert!(rendered.contains("Fix: "));
    }
}
