//! Error types for the credential store and URL resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, saving or interpreting credentials.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the configuration file failed.
    #[error("can't access config file '{}': {source}", path.display())]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file exists but doesn't contain a valid record.
    #[error("can't parse config file '{}': {source}", path.display())]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The record couldn't be serialized.
    #[error("can't serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The OS secret store failed.
    #[error("keyring '{backend}' failed: {source}")]
    Keyring {
        /// Name of the keyring backend.
        backend: String,
        /// The underlying keyring error.
        source: keyring::Error,
    },

    /// The requested keyring backend isn't available on this platform.
    #[error("keyring backend '{name}' isn't supported, valid backends are: {valid}")]
    UnsupportedKeyring {
        /// The requested backend name.
        name: String,
        /// Comma separated list of supported backends.
        valid: String,
    },

    /// Neither a home directory nor a config directory could be determined.
    #[error("can't determine the home or config directory of the current user")]
    NoHomeDirectory,

    /// The gateway or token URL isn't a valid absolute URL.
    #[error("{origin} URL '{url}' isn't valid: {reason}. Valid aliases are: {aliases}")]
    InvalidUrl {
        /// Where the URL came from: `flag`, `config` or `default`.
        origin: crate::gateway::UrlSource,
        /// The offending value.
        url: String,
        /// Why it was rejected.
        reason: String,
        /// Comma separated list of URL aliases.
        aliases: String,
    },

    /// A stored token couldn't be inspected.
    #[error(transparent)]
    Token(#[from] ocm_auth::Error),

    /// The named setting doesn't exist.
    #[error("unknown setting '{name}', valid settings are: {valid}")]
    UnknownSetting {
        /// The requested setting.
        name: String,
        /// Comma separated list of settings.
        valid: String,
    },

    /// The value given for a setting can't be stored.
    #[error("invalid value for setting '{name}': {reason}")]
    InvalidSetting {
        /// The setting name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, Error>;
