//! Error types surfaced by the client stores.

use animeverse_api_models::ModelError;
use thiserror::Error;

use crate::storage::StorageError;

/// Primary error type for client operations.
///
/// Local precondition failures share this type with remote failures so
/// callers handle both the same way.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("request to {path} failed")]
    Transport {
        /// Request path relative to the API base.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic fallback.
        message: String,
    },
    /// A 401 could not be recovered by refreshing the token; sign in again.
    #[error("session expired, please sign in again")]
    SessionExpired,
    /// The operation needs an active profile and none is selected.
    #[error("select a profile first")]
    NoActiveProfile,
    /// The requested profile is not in the loaded list.
    #[error("profile '{id}' not found")]
    ProfileNotFound {
        /// Requested profile identifier.
        id: String,
    },
    /// The signed-in account is not an administrator.
    #[error("administrator privileges required")]
    AdminRequired,
    /// Input failed local validation.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("unexpected response from {path}")]
    Decode {
        /// Request path relative to the API base.
        path: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Persisting client state failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// HTTP status for server-side failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

impl From<ModelError> for ClientError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::InvalidField { field, message } => Self::InvalidField {
                field: field.to_string(),
                message,
            },
            ModelError::UnknownValue { kind, value } => Self::InvalidField {
                field: kind.to_string(),
                message: format!("unknown value '{value}'"),
            },
        }
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
