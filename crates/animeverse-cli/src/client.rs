//! Error type, configuration resolution, and store construction for the CLI.

use std::fmt::{self, Display, Formatter};

use animeverse_client::{Animeverse, ClientError};
use animeverse_config::{
    ClientConfig, ConfigError, ENV_API_URL, ENV_LOG, ENV_LOG_FORMAT, ENV_STATE_FILE,
    ENV_TIMEOUT_SECS,
};
use anyhow::anyhow;

use crate::cli::{GlobalArgs, OutputFormat};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ClientError> for CliError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::InvalidField { .. }
            | ClientError::NoActiveProfile
            | ClientError::ProfileNotFound { .. }
            | ClientError::AdminRequired => Self::Validation(error.to_string()),
            ClientError::SessionExpired => {
                Self::Validation("session expired; sign in again with `animeverse login`".into())
            }
            ClientError::Api { status, message } if matches!(status, 400 | 404 | 409 | 422) => {
                Self::Validation(message)
            }
            ClientError::Api { status, message } => {
                Self::Failure(anyhow!("{message} (status {status})"))
            }
            other => Self::Failure(anyhow::Error::new(other)),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Stores and rendering preferences passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) app: Animeverse,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    /// Fail unless a session is present.
    pub(crate) fn require_session(&self) -> CliResult<()> {
        if self.app.session().is_authenticated() {
            Ok(())
        } else {
            Err(CliError::validation(
                "not signed in (run `animeverse login` first)",
            ))
        }
    }

    /// Load the account's profiles so the persisted selection is restored.
    pub(crate) async fn restore_profiles(&self) -> CliResult<()> {
        self.require_session()?;
        self.app.profiles().sync_with_session().await?;
        Ok(())
    }
}

/// Resolve configuration from flags (which already carry environment
/// fallbacks) through the shared validators.
pub(crate) fn resolve_config(args: &GlobalArgs) -> CliResult<ClientConfig> {
    let config = ClientConfig::from_lookup(|key| match key {
        ENV_API_URL => args.api_url.clone(),
        ENV_TIMEOUT_SECS => args.timeout.map(|secs| secs.to_string()),
        ENV_STATE_FILE => Some(args.state_file.display().to_string()),
        ENV_LOG => args.log.clone(),
        ENV_LOG_FORMAT => args.log_format.clone(),
        _ => None,
    })?;
    Ok(config)
}

/// Build the stores described by `config`.
pub(crate) fn build_context(config: &ClientConfig, output: OutputFormat) -> CliResult<AppContext> {
    let app = Animeverse::from_config(config)?;
    Ok(AppContext { app, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn args() -> GlobalArgs {
        GlobalArgs {
            api_url: None,
            timeout: None,
            state_file: PathBuf::from("state.json"),
            log: None,
            log_format: None,
            output: OutputFormat::Table,
        }
    }

    #[test]
    fn flags_flow_through_config_validation() -> Result<(), CliError> {
        let mut flags = args();
        flags.api_url = Some("https://anime.example.com/api/".into());
        flags.timeout = Some(30);
        let config = resolve_config(&flags)?;
        assert_eq!(config.api_url, "https://anime.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.state_file, Some(PathBuf::from("state.json")));
        Ok(())
    }

    #[test]
    fn invalid_flags_are_validation_errors() {
        let mut flags = args();
        flags.timeout = Some(0);
        let err = resolve_config(&flags).expect_err("timeout of zero is rejected");
        assert_eq!(err.exit_code(), 2);

        let mut flags = args();
        flags.api_url = Some("ftp://anime.example.com".into());
        assert!(matches!(resolve_config(&flags), Err(CliError::Validation(_))));
    }

    #[test]
    fn client_errors_map_to_exit_codes() {
        assert_eq!(CliError::from(ClientError::AdminRequired).exit_code(), 2);
        assert_eq!(CliError::from(ClientError::SessionExpired).exit_code(), 2);
        let missing = CliError::from(ClientError::Api {
            status: 404,
            message: "Anime not found".into(),
        });
        assert_eq!(missing.display_message(), "Anime not found");
        let outage = CliError::from(ClientError::Api {
            status: 503,
            message: "maintenance".into(),
        });
        assert_eq!(outage.exit_code(), 3);
        assert_eq!(outage.display_message(), "maintenance (status 503)");
    }
}
