//! Error types for parsing and validating wire models.

use thiserror::Error;

/// Errors raised while parsing enum values or validating drafts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A textual value did not match any known variant.
    #[error("unknown {kind} '{value}'")]
    UnknownValue {
        /// Kind of value being parsed (e.g. `content rating`).
        kind: &'static str,
        /// Raw value supplied by the caller.
        value: String,
    },
    /// A draft field failed validation.
    #[error("invalid value for '{field}': {message}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },
}

/// Convenience alias for model results.
pub type ModelResult<T> = Result<T, ModelError>;
