//! POMDP models as seen by the solver.
//!
//! The solver only ever reads a model: available actions per state, the
//! joint (next state, observation) distribution per state-action pair, and
//! per-objective rewards.

mod explicit;

pub use explicit::{ExplicitPomdp, ExplicitPomdpBuilder, ModelFile, RewardEntry, TransitionEntry};

use std::path::PathBuf;

use pv_math::{ActionSupport, Belief};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One outcome of taking an action: land in `next` and observe `obs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Successor {
    pub next: usize,
    pub obs: usize,
    pub prob: f64,
}

/// Read-only POMDP interface consumed by value iteration.
///
/// `ActionSupport` supplies the per-state action lists used by the
/// feasibility gate on alpha-matrices.
pub trait Pomdp: ActionSupport + Sync {
    fn num_states(&self) -> usize;
    fn num_actions(&self) -> usize;
    fn num_observations(&self) -> usize;

    /// Reward dimensions; 1 for an ordinary POMDP.
    fn num_objectives(&self) -> usize {
        1
    }

    fn discount(&self) -> f64;

    /// Nonzero-probability outcomes of `action` in `state`.
    ///
    /// Empty when `action` is not available in `state`.
    fn successors(&self, state: usize, action: usize) -> &[Successor];

    /// Immediate reward for `objective`.
    fn reward(&self, state: usize, action: usize, objective: usize) -> f64;

    /// Distribution over states for a belief.
    ///
    /// Explicit models store beliefs directly as state distributions.
    fn to_distribution_over_states(&self, belief: &Belief) -> Vec<f64> {
        belief.probs().to_vec()
    }

    /// Actions available in at least one state, ascending.
    fn used_actions(&self) -> Vec<usize> {
        let mut used = vec![false; self.num_actions()];
        for s in 0..self.num_states() {
            for &a in self.available_actions(s) {
                used[a] = true;
            }
        }
        (0..self.num_actions()).filter(|&a| used[a]).collect()
    }

    /// Whether `action` can be taken in `state`.
    fn is_available(&self, state: usize, action: usize) -> bool {
        self.available_actions(state).contains(&action)
    }
}

/// Errors that can occur while loading or validating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid JSON in model file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model field {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ModelError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ModelError> for pv_common::Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound { path } => pv_common::Error::ModelNotFound {
                path: path.display().to_string(),
            },
            ModelError::Invalid { .. } => pv_common::Error::InvalidModel(err.to_string()),
            ModelError::Parse { .. } | ModelError::Io { .. } => {
                pv_common::Error::Model(err.to_string())
            }
        }
    }
}
