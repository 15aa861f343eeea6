//! State threaded through a single command.

use ocm_config::{CredentialRecord, CredentialStore, Environment};
use tracing::debug;

use crate::error::CliError;

/// The environment snapshot, the credential store and the record it holds.
///
/// The record is loaded once when the context is built and written back
/// with [`Context::save`].
#[derive(Debug)]
pub struct Context {
    env: Environment,
    store: CredentialStore,
    record: Option<CredentialRecord>,
}

impl Context {
    /// Builds the context, picking the store from the environment and
    /// loading the saved record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be opened or read.
    pub fn from_environment(env: Environment) -> Result<Self, CliError> {
        let store = CredentialStore::from_environment(&env)?;
        Self::with_store(env, store)
    }

    /// Builds the context over an explicit store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read.
    pub fn with_store(env: Environment, store: CredentialStore) -> Result<Self, CliError> {
        let record = store.load()?;
        debug!(location = %store.location(), loaded = record.is_some(), "opened credential store");
        Ok(Self { env, store, record })
    }

    /// The environment snapshot.
    #[must_use]
    pub const fn env(&self) -> &Environment {
        &self.env
    }

    /// The credential store.
    #[must_use]
    pub const fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// The saved record, `None` before the first login.
    #[must_use]
    pub const fn record(&self) -> Option<&CredentialRecord> {
        self.record.as_ref()
    }

    /// The record, created empty if nothing was saved.
    pub fn record_mut(&mut self) -> &mut CredentialRecord {
        self.record.get_or_insert_with(CredentialRecord::default)
    }

    /// Replaces the record.
    pub fn replace(&mut self, record: CredentialRecord) {
        self.record = Some(record);
    }

    /// Writes the record back to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    pub fn save(&self) -> Result<(), CliError> {
        if let Some(record) = &self.record {
            self.store.save(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &tempfile::TempDir) -> Context {
        let env = Environment {
            config_path: Some(dir.path().join("ocm.json")),
            ..Environment::default()
        };
        Context::from_environment(env).expect("context")
    }

    #[test]
    fn empty_store_has_no_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&dir);
        assert!(ctx.record().is_none());
        assert_eq!(ctx.store().location(), dir.path().join("ocm.json").display().to_string());
    }

    #[test]
    fn save_without_record_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&dir);
        ctx.save().expect("save");
        assert!(!dir.path().join("ocm.json").exists());
    }

    #[test]
    fn record_mut_then_save_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ctx = context(&dir);
        ctx.record_mut().url = "https://api.example.com".to_string();
        ctx.save().expect("save");

        let reopened = context(&dir);
        assert_eq!(
            reopened.record().map(|r| r.url.as_str()),
            Some("https://api.example.com")
        );
    }

    #[test]
    fn replace_swaps_the_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ctx = context(&dir);
        ctx.replace(CredentialRecord {
            user: "alice".to_string(),
            ..CredentialRecord::default()
        });
        assert_eq!(ctx.record().map(|r| r.user.as_str()), Some("alice"));
    }
}
