//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field contained an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Environment variable or field name.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Human-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, value: &str, reason: &'static str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            value: Some(value.to_string()),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
