//! Shared types for the POMDP value-iteration workspace.
//!
//! - Unified error type with stable codes and categories
//! - Output format selection for the CLI

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
