//! Environment variable names and fallback values.
//!
//! # Design
//! - Keep every default in one place so the CLI help text and the loader agree.

/// Base URL of the REST API.
pub const ENV_API_URL: &str = "ANIMEVERSE_API_URL";
/// Transport timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "ANIMEVERSE_HTTP_TIMEOUT_SECS";
/// Path of the persisted client state file.
pub const ENV_STATE_FILE: &str = "ANIMEVERSE_STATE_FILE";
/// Log filter directive.
pub const ENV_LOG: &str = "ANIMEVERSE_LOG";
/// Log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "ANIMEVERSE_LOG_FORMAT";

/// API base used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8800/api";
/// Transport timeout used when nothing is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Upper bound accepted for the transport timeout.
pub const MAX_TIMEOUT_SECS: u64 = 300;
