//! Point-based value iteration.
//!
//! One stage is a full Bellman backup of the current value-function set:
//! backproject every element through each (action, observation) pair,
//! cross-sum the per-observation sets of each action with pruning after
//! every fold, then take the union over actions.

mod backup;
mod policy_graph;
mod query;
mod value_iteration;

pub use backup::{backproject_values, Backup};
pub use policy_graph::{PolicyGraph, PolicyNode};
pub use value_iteration::{ActionStats, Solution, StageOutcome, Termination, ValueIteration};

use pv_math::MathError;
use thiserror::Error;

/// Errors raised while solving or querying a solution.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error("model makes no action available in any state")]
    NoActions,

    #[error("belief has {actual} entries, model has {expected} states")]
    BeliefDimension { expected: usize, actual: usize },

    #[error("weight vector has {actual} entries, model has {expected} objectives")]
    WeightDimension { expected: usize, actual: usize },

    #[error("probe belief {index} has {actual} entries, model has {expected} states")]
    ProbeDimension {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("policy graph was not tracked for this solution")]
    PolicyGraphUnavailable,

    #[error("value-function element in slot {slot} carries no action")]
    UntaggedElement { slot: usize },

    #[error("policy graph has no node {node}")]
    UnknownNode { node: usize },

    #[error("observation {obs} out of range (observations = {num})")]
    UnknownObservation { obs: usize, num: usize },
}

impl From<SolverError> for pv_common::Error {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Math(MathError::EmptySet) => pv_common::Error::EmptyValueFunction,
            SolverError::Math(MathError::NoFeasibleElement) => pv_common::Error::NoFeasibleAction,
            SolverError::PolicyGraphUnavailable => pv_common::Error::PolicyGraphUnavailable,
            SolverError::ProbeDimension { .. } => {
                pv_common::Error::InvalidSolverConfig(err.to_string())
            }
            SolverError::Math(MathError::InvalidBelief(_))
            | SolverError::BeliefDimension { .. }
            | SolverError::WeightDimension { .. }
            | SolverError::UnknownNode { .. }
            | SolverError::UnknownObservation { .. } => {
                pv_common::Error::InvalidQuery(err.to_string())
            }
            other => pv_common::Error::Solver(other.to_string()),
        }
    }
}
