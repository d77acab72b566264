//! Exit codes for the pv-core CLI.
//!
//! Exit codes communicate the solve outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

/// Exit codes for pv-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Value iteration converged (or the command succeeded)
    Converged = 0,

    /// Stage or time budget exhausted before convergence
    BudgetExhausted = 1,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Solver configuration missing or invalid
    ConfigError = 11,

    /// Model file missing or invalid
    ModelError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an operational outcome (codes 0-1).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Converged => "OK_CONVERGED",
            ExitCode::BudgetExhausted => "OK_BUDGET_EXHAUSTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_consistent() {
        assert!(ExitCode::Converged.is_operational());
        assert!(ExitCode::BudgetExhausted.is_operational());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::ModelError.is_user_error());
        assert!(ExitCode::InternalError.is_internal_error());
        assert!(!ExitCode::ArgsError.is_internal_error());
    }

    #[test]
    fn display_includes_number() {
        assert_eq!(ExitCode::ModelError.to_string(), "ERR_MODEL (12)");
        assert_eq!(i32::from(ExitCode::BudgetExhausted), 1);
    }
}
