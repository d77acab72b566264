//! Recoverable errors for value-function queries.
//!
//! Length, action and objective-count mismatches are caller bugs and panic
//! instead of surfacing here.

use thiserror::Error;

/// Errors from alpha-set queries and arena lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("alpha set is empty; no optimum is defined")]
    EmptySet,

    #[error("no element of the alpha set is feasible at this belief")]
    NoFeasibleElement,

    #[error("stale set index: handle belongs to generation {handle}, set is generation {set}")]
    StaleIndex { handle: u64, set: u64 },

    #[error("set index {slot} out of range for a set of {len} elements")]
    IndexOutOfRange { slot: usize, len: usize },

    #[error("invalid belief: {0}")]
    InvalidBelief(String),
}

/// Result type for pv-math operations.
pub type Result<T> = std::result::Result<T, MathError>;
