//! Snapshot of the process environment the credential store depends on.
//!
//! The variables are read once, at startup, so the rest of the code (and the
//! tests) work from plain values instead of the global environment.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Overrides the location of the configuration file.
pub const CONFIG_ENV: &str = "OCM_CONFIG";

/// Selects a keyring backend instead of the configuration file.
pub const KEYRING_ENV: &str = "OCM_KEYRING";

/// Overrides the gateway URL for commands other than `login`.
pub const URL_ENV: &str = "OCM_URL";

/// Configuration file name inside the per-user config directory.
const CONFIG_FILE: &str = "ocm.json";

/// Directory created inside the per-user config directory.
const CONFIG_SUBDIR: &str = "ocm";

/// Location used by older releases, relative to the home directory.
const LEGACY_CONFIG_FILE: &str = ".ocm.json";

/// Values read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Value of `OCM_CONFIG`.
    pub config_path: Option<PathBuf>,
    /// Value of `OCM_KEYRING`.
    pub keyring: Option<String>,
    /// Value of `OCM_URL`.
    pub url: Option<String>,
    /// Home directory of the current user.
    pub home_dir: Option<PathBuf>,
    /// Platform config directory of the current user.
    pub config_dir: Option<PathBuf>,
}

impl Environment {
    /// Reads the environment of the current process.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            config_path: non_empty_var(CONFIG_ENV).map(PathBuf::from),
            keyring: non_empty_var(KEYRING_ENV),
            url: non_empty_var(URL_ENV),
            home_dir: dirs::home_dir(),
            config_dir: dirs::config_dir(),
        }
    }

    /// Returns the keyring backend name, if one was selected.
    #[must_use]
    pub fn keyring_backend(&self) -> Option<&str> {
        self.keyring.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns the gateway URL override, if one was set.
    #[must_use]
    pub fn url_override(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// Resolves the location of the configuration file.
    ///
    /// In order: the `OCM_CONFIG` override; the legacy `~/.ocm.json` if it
    /// already exists; `<config dir>/ocm/ocm.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and neither the home nor the
    /// config directory is known.
    pub fn config_location(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config_path {
            debug!(path = %path.display(), "using config file from {CONFIG_ENV}");
            return Ok(path.clone());
        }

        if let Some(legacy) = self.home_dir.as_deref().map(legacy_location) {
            if legacy.exists() {
                debug!(path = %legacy.display(), "using legacy config file");
                return Ok(legacy);
            }
        }

        self.config_dir
            .as_deref()
            .map(|dir| dir.join(CONFIG_SUBDIR).join(CONFIG_FILE))
            .ok_or(Error::NoHomeDirectory)
    }
}

fn legacy_location(home: &Path) -> PathBuf {
    home.join(LEGACY_CONFIG_FILE)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
