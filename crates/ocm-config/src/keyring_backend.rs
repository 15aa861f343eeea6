//! OS secret store backend for the credential record.
//!
//! The whole credential record is stored as a single JSON secret. Which
//! native store is used is chosen by name through `OCM_KEYRING`; the names
//! available depend on the platform the binary was built for.

use keyring::Entry;
use keyring::credential::CredentialBuilder;
use tracing::debug;

use crate::error::{Error, Result};

/// Service name of the secret.
pub const SERVICE: &str = "ocm-cli";

/// Account name of the secret.
pub const ACCOUNT: &str = "default";

/// Returns the keyring backends available on this platform.
#[must_use]
pub const fn supported_backends() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["keychain"]
    } else if cfg!(target_os = "windows") {
        &["wincred"]
    } else if cfg!(target_os = "linux") {
        &["keyctl"]
    } else {
        &[]
    }
}

fn platform_builder(name: &str) -> Option<Box<CredentialBuilder>> {
    match name {
        #[cfg(target_os = "macos")]
        "keychain" => Some(keyring::macos::default_credential_builder()),
        #[cfg(target_os = "windows")]
        "wincred" => Some(keyring::windows::default_credential_builder()),
        #[cfg(target_os = "linux")]
        "keyctl" => Some(keyring::keyutils::default_credential_builder()),
        _ => None,
    }
}

/// A single secret in a native secret store.
#[derive(Debug)]
pub struct KeyringBackend {
    name: String,
    entry: Entry,
}

impl KeyringBackend {
    /// Opens the secret in the named native store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend isn't available on this platform or
    /// the entry can't be created.
    pub fn open(name: &str) -> Result<Self> {
        let builder = platform_builder(name).ok_or_else(|| Error::UnsupportedKeyring {
            name: name.to_string(),
            valid: supported_backends().join(", "),
        })?;
        Self::with_builder(name, builder.as_ref())
    }

    /// Opens the secret using an explicit credential builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder can't create the entry.
    pub fn with_builder(name: &str, builder: &CredentialBuilder) -> Result<Self> {
        let credential = builder
            .build(None, SERVICE, ACCOUNT)
            .map_err(|source| keyring_error(name, source))?;
        debug!(backend = name, service = SERVICE, "opened keyring entry");
        Ok(Self {
            name: name.to_string(),
            entry: Entry::new_with_credential(credential),
        })
    }

    #[cfg(test)]
    pub(crate) const fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Returns the backend name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the secret, `None` if there is no entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read.
    pub fn read(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(payload) => Ok(Some(payload)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(keyring_error(&self.name, source)),
        }
    }

    /// Writes the secret, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    pub fn write(&self, payload: &str) -> Result<()> {
        self.entry
            .set_password(payload)
            .map_err(|source| keyring_error(&self.name, source))
    }

    /// Deletes the secret. A missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    pub fn remove(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(source) => Err(keyring_error(&self.name, source)),
        }
    }
}

fn keyring_error(name: &str, source: keyring::Error) -> Error {
    Error::Keyring {
        backend: name.to_string(),
        source,
    }
}
