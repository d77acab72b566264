//! Solver configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust struct for solver.json
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots for solver output

pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod solver;
pub mod validate;

pub use load::{load_config, ConfigError, ResolvedConfig};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use solver::SolverConfig;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
