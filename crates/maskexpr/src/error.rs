//! Error types for maskexpr.

use thiserror::Error;

/// Main error type for expression compilation.
#[derive(Debug, Error)]
pub enum ExprError {
    /// The expression text could not be tokenized or parsed
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// An identifier could not be resolved to a flag bit
    #[error("'{0}' is not a known flag name")]
    UnknownName(String),
}

/// Result type alias for expression compilation.
pub type Result<T> = std::result::Result<T, ExprError>;
