//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::solver::SolverConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Allowed deviation of a probe belief's mass from 1.
const PROBE_SUM_TOLERANCE: f64 = 1e-6;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a solver configuration semantically.
pub fn validate_solver_config(config: &SolverConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "tolerance".to_string(),
            message: format!("Must be finite and > 0, got {}", config.tolerance),
        });
    }

    if config.max_stages == 0 {
        return Err(ValidationError::InvalidValue {
            field: "max_stages".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if let Some(limit) = config.time_limit_secs {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "time_limit_secs".to_string(),
                message: format!("Must be finite and > 0, got {}", limit),
            });
        }
    }

    for (i, probe) in config.probe_beliefs.iter().enumerate() {
        validate_probe(i, probe)?;
    }

    if let Some(first) = config.probe_beliefs.first() {
        if config.probe_beliefs.iter().any(|p| p.len() != first.len()) {
            return Err(ValidationError::SemanticError(
                "probe_beliefs must all have the same number of states".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_probe(i: usize, probe: &[f64]) -> ValidationResult<()> {
    let field = format!("probe_beliefs[{}]", i);
    if probe.is_empty() {
        return Err(ValidationError::InvalidValue {
            field,
            message: "Must not be empty".to_string(),
        });
    }
    if let Some(p) = probe.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(ValidationError::InvalidValue {
            field,
            message: format!("Probabilities must be finite and >= 0, got {}", p),
        });
    }
    let sum: f64 = probe.iter().sum();
    if (sum - 1.0).abs() > PROBE_SUM_TOLERANCE {
        return Err(ValidationError::InvalidValue {
            field,
            message: format!("Probabilities must sum to 1.0, got {}", sum),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_solver_config(&SolverConfig::default()).is_ok());
    }

    #[test]
    fn rejects_nonpositive_tolerance() {
        let cfg = SolverConfig::default().with_tolerance(0.0);
        let err = validate_solver_config(&cfg).unwrap_err();
        assert_eq!(err.code(), 65);
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn rejects_zero_stages() {
        let cfg = SolverConfig::default().with_max_stages(0);
        assert!(validate_solver_config(&cfg).is_err());
    }

    #[test]
    fn rejects_bad_probe() {
        let mut cfg = SolverConfig::default();
        cfg.probe_beliefs = vec![vec![0.5, 0.6]];
        assert!(validate_solver_config(&cfg).is_err());

        cfg.probe_beliefs = vec![vec![0.5, 0.5], vec![1.0, 0.0, 0.0]];
        assert!(matches!(
            validate_solver_config(&cfg),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn rejects_version_mismatch() {
        let mut cfg = SolverConfig::default();
        cfg.schema_version = "0.9.0".to_string();
        assert_eq!(validate_solver_config(&cfg).unwrap_err().code(), 66);
    }
}
