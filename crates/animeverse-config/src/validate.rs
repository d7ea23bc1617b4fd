//! Parsers for individual configuration fields.

use std::time::Duration;

use animeverse_telemetry::LogFormat;
use url::Url;

use crate::defaults::MAX_TIMEOUT_SECS;
use crate::error::{ConfigError, ConfigResult};

/// Validate an API base URL and strip trailing slashes.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an absolute
/// `http`/`https` URL.
pub fn parse_api_url(field: &str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    let parsed =
        Url::parse(trimmed).map_err(|_| ConfigError::invalid(field, value, "must be an absolute URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(field, value, "scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::invalid(field, value, "must include a host"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Parse a timeout in whole seconds within `1..=MAX_TIMEOUT_SECS`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for non-numeric or out-of-range input.
pub fn parse_timeout(field: &str, value: &str) -> ConfigResult<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, value, "must be a whole number of seconds"))?;
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(ConfigError::invalid(field, value, "must be between 1 and 300"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a log format name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for names other than `json`/`pretty`.
pub fn parse_log_format(field: &str, value: &str) -> ConfigResult<LogFormat> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(field, value, "must be json or pretty"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_is_normalised() -> ConfigResult<()> {
        assert_eq!(
            parse_api_url("url", "https://anime.example.com/api/")?,
            "https://anime.example.com/api"
        );
        assert!(parse_api_url("url", "ftp://anime.example.com").is_err());
        assert!(parse_api_url("url", "not a url").is_err());
        Ok(())
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        assert_eq!(parse_timeout("t", "30").ok(), Some(Duration::from_secs(30)));
        assert!(parse_timeout("t", "0").is_err());
        assert!(parse_timeout("t", "301").is_err());
        assert!(matches!(
            parse_timeout("t", "soon"),
            Err(ConfigError::InvalidField { reason: "must be a whole number of seconds", .. })
        ));
    }
}
