//! Typed client configuration.

use std::path::PathBuf;
use std::time::Duration;

use animeverse_telemetry::LogFormat;

use crate::defaults::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

/// Resolved configuration for the client core and CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base URL without a trailing slash.
    pub api_url: String,
    /// Transport timeout per request.
    pub timeout: Duration,
    /// Where persisted session/profile state lives; `None` keeps it in memory.
    pub state_file: Option<PathBuf>,
    /// Log filter directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_file: None,
            log_level: animeverse_telemetry::DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::infer(),
        }
    }
}

impl ClientConfig {
    /// Return a copy pointed at `api_url` (already validated by the caller).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Return a copy persisting state to `path`.
    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }
}
