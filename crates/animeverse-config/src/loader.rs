//! Assemble [`ClientConfig`] from environment variables.
//!
//! # Design
//! - `from_lookup` takes any key lookup so tests never touch the process env.
//! - Unset and blank variables fall back to defaults; set-but-invalid values
//!   are errors rather than silently ignored.

use std::path::PathBuf;

use tracing::debug;

use crate::defaults::{ENV_API_URL, ENV_LOG, ENV_LOG_FORMAT, ENV_STATE_FILE, ENV_TIMEOUT_SECS};
use crate::error::ConfigResult;
use crate::model::ClientConfig;
use crate::validate::{parse_api_url, parse_log_format, parse_timeout};

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field encountered.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field encountered.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = read(ENV_API_URL) {
            config.api_url = parse_api_url(ENV_API_URL, &value)?;
        }
        if let Some(value) = read(ENV_TIMEOUT_SECS) {
            config.timeout = parse_timeout(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = read(ENV_STATE_FILE) {
            config.state_file = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = read(ENV_LOG) {
            config.log_level = value.trim().to_string();
        }
        if let Some(value) = read(ENV_LOG_FORMAT) {
            config.log_format = parse_log_format(ENV_LOG_FORMAT, &value)?;
        }

        debug!(
            api_url = %config.api_url,
            timeout_secs = config.timeout.as_secs(),
            persisted = config.state_file.is_some(),
            "client configuration resolved"
        );
        Ok(config)
    }
}
