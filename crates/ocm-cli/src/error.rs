//! CLI error types.

use std::fmt;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The stored credentials can't be used; carries the reason.
    NotArmed(String),
    /// Loading, saving or resolving configuration failed.
    Config(ocm_config::Error),
    /// A token couldn't be inspected.
    Token(ocm_auth::Error),
    /// The token endpoint refused to issue tokens.
    Auth(String),
    /// The HTTP transport failed.
    Connection(String),
    /// The gateway answered with an error status.
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotArmed(reason) => {
                write!(f, "not logged in, {reason}, run the 'login' command")
            }
            Self::Config(e) => write!(f, "{e}"),
            Self::Token(e) => write!(f, "{e}"),
            Self::Auth(msg) => write!(f, "can't get tokens: {msg}"),
            Self::Connection(msg) => write!(f, "connection error: {msg}"),
            Self::Http { status, message } => write!(f, "request failed with status {status}: {message}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Token(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ocm_config::Error> for CliError {
    fn from(err: ocm_config::Error) -> Self {
        Self::Config(err)
    }
}

impl From<ocm_auth::Error> for CliError {
    fn from(err: ocm_auth::Error) -> Self {
        Self::Token(err)
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<ocm_config::NotArmedReason> for CliError {
    fn from(reason: ocm_config::NotArmedReason) -> Self {
        Self::NotArmed(reason.message().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocm_config::NotArmedReason;

    #[test]
    fn cli_error_display_not_armed() {
        let err = CliError::from(NotArmedReason::CredentialsNotSet);
        assert_eq!(
            err.to_string(),
            "not logged in, credentials aren't set, run the 'login' command"
        );
    }

    #[test]
    fn cli_error_display_http() {
        let err = CliError::Http {
            status: 404,
            message: "not found".into(),
        };
        assert_eq!(err.to_string(), "request failed with status 404: not found");
    }

    #[test]
    fn cli_error_from_config_error_keeps_message() {
        let err = CliError::from(ocm_config::Error::NoHomeDirectory);
        assert_eq!(
            err.to_string(),
            "can't determine the home or config directory of the current user"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
