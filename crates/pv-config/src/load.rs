//! Loading solver.json from disk with validation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::resolve::{resolve_config, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::solver::SolverConfig;
use crate::validate::{validate_solver_config, ValidationError};

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
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

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub solver: SolverConfig,
    /// Path the config was read from (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// Raw file content, kept for hashing.
    pub raw_json: Option<String>,
}

impl ResolvedConfig {
    /// Built-in defaults with no backing file.
    pub fn builtin() -> Self {
        Self {
            solver: SolverConfig::default(),
            path: None,
            source: ConfigSource::BuiltinDefault,
            raw_json: None,
        }
    }

    /// Create a config snapshot for solver output.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(
            &self.solver,
            self.path.as_deref(),
            self.source,
            self.raw_json.as_deref(),
        )
    }
}

/// Resolve, read and validate the solver config.
///
/// An explicit `cli_path` that does not exist is an error rather than a
/// silent fallback.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let paths = resolve_config(cli_path);
    match paths.solver {
        Some(path) => {
            let (solver, raw) = load_from_file(&path)?;
            Ok(ResolvedConfig {
                solver,
                path: Some(path),
                source: paths.source,
                raw_json: Some(raw),
            })
        }
        None => Ok(ResolvedConfig::builtin()),
    }
}

/// Read and validate a single solver.json, returning it with its raw text.
pub fn load_from_file(path: &Path) -> Result<(SolverConfig, String), ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let solver = parse_config(&raw, path)?;
    Ok((solver, raw))
}

/// Parse and validate solver.json content.
pub fn parse_config(json: &str, path: &Path) -> Result<SolverConfig, ConfigError> {
    let solver: SolverConfig = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_solver_config(&solver)?;
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_bad_json() {
        let err = parse_config("{not json", Path::new("x.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn parse_runs_validation() {
        let err = parse_config(r#"{"max_stages": 0}"#, Path::new("x.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn explicit_missing_path_is_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/solver.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
