//! Credential persistence.
//!
//! The record lives either in a JSON file or in a native secret store. The
//! backend is picked once, when the store is built, and every load and save
//! goes to the same place.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::keyring_backend::KeyringBackend;
use crate::record::CredentialRecord;

/// Where the credential record is kept.
#[derive(Debug)]
pub enum Backend {
    /// A JSON file readable only by its owner.
    File(PathBuf),
    /// A native secret store.
    Keyring(KeyringBackend),
}

/// Loads and saves the credential record.
#[derive(Debug)]
pub struct CredentialStore {
    backend: Backend,
}

impl CredentialStore {
    /// Creates a store over an explicit backend.
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Creates a store backed by the given file.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Backend::File(path.into()))
    }

    /// Picks the backend selected by the environment.
    ///
    /// A non-empty `OCM_KEYRING` selects that keyring; otherwise the file
    /// location is resolved from `OCM_CONFIG` and the user's directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyring isn't available or no file location
    /// can be determined.
    pub fn from_environment(env: &Environment) -> Result<Self> {
        let backend = match env.keyring_backend() {
            Some(name) => Backend::Keyring(KeyringBackend::open(name)?),
            None => Backend::File(env.config_location()?),
        };
        Ok(Self::new(backend))
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Describes where the record is kept, for display.
    #[must_use]
    pub fn location(&self) -> String {
        match &self.backend {
            Backend::File(path) => path.display().to_string(),
            Backend::Keyring(keyring) => format!("keyring:{}", keyring.name()),
        }
    }

    /// Loads the record, `None` if nothing has been saved yet.
    ///
    /// A keyring payload that can't be decoded, as text or as JSON, is treated
    /// as missing so that a corrupt entry never blocks `login`. A corrupt file
    /// is an error, since the user can inspect and fix it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend can't be read or the file can't be parsed.
    pub fn load(&self) -> Result<Option<CredentialRecord>> {
        match &self.backend {
            Backend::File(path) => load_file(path),
            Backend::Keyring(keyring) => {
                let payload = match keyring.read() {
                    Ok(Some(payload)) => payload,
                    Ok(None) => {
                        debug!(backend = keyring.name(), "no credentials in keyring");
                        return Ok(None);
                    }
                    Err(Error::Keyring {
                        source: keyring::Error::BadEncoding(_),
                        ..
                    }) => {
                        warn!(backend = keyring.name(), "ignoring keyring entry that isn't UTF-8");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                match serde_json::from_str(&payload) {
                    Ok(record) => Ok(Some(record)),
                    Err(e) => {
                        warn!(backend = keyring.name(), error = %e, "ignoring undecodable keyring entry");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Saves the record, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// Returns an error if the record can't be written.
    pub fn save(&self, record: &CredentialRecord) -> Result<()> {
        let payload = serde_json::to_string_pretty(record).map_err(Error::Serialize)?;
        match &self.backend {
            Backend::File(path) => save_file(path, &payload),
            Backend::Keyring(keyring) => {
                keyring.write(&payload)?;
                debug!(backend = keyring.name(), "saved credentials to keyring");
                Ok(())
            }
        }
    }

    /// Deletes the stored record. Nothing stored is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend can't be written.
    pub fn remove(&self) -> Result<()> {
        match &self.backend {
            Backend::File(path) => match fs::remove_file(path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed config file");
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(io_error(path, source)),
            },
            Backend::Keyring(keyring) => keyring.remove(),
        }
    }
}

fn load_file(path: &Path) -> Result<Option<CredentialRecord>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file doesn't exist");
            return Ok(None);
        }
        Err(source) => return Err(io_error(path, source)),
    };
    let record = serde_json::from_slice(&contents).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(Some(record))
}

fn save_file(path: &Path, payload: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent).map_err(|source| io_error(parent, source))?;
    }

    let mut file = open_private(path).map_err(|source| io_error(path, source))?;
    file.write_all(payload.as_bytes())
        .map_err(|source| io_error(path, source))?;

    // The file may predate this release with looser permissions.
    restrict_permissions(path).map_err(|source| io_error(path, source))?;

    debug!(path = %path.display(), "saved config file");
    Ok(())
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}
