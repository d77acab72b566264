//! POMDP Value Iteration Core Library
//!
//! This library provides:
//! - Exit codes for CLI operations
//! - The POMDP model abstraction and an explicit JSON-backed model
//! - Point-based value iteration over alpha-vectors and alpha-matrices
//! - Policy-graph extraction from a converged solution
//! - Structured logging setup
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod solver;

pub use model::{ExplicitPomdp, ModelError, Pomdp, Successor};
pub use solver::{
    Backup, PolicyGraph, Solution, SolverError, StageOutcome, Termination, ValueIteration,
};
