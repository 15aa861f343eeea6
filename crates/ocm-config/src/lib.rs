//! # ocm-config
//!
//! Credential lifecycle for the OCM command-line client.
//!
//! - [`CredentialRecord`]: everything persisted about how to authenticate
//! - [`CredentialStore`]: loads and saves the record, to a file or a keyring
//! - [`armed::evaluate`]: whether the record is enough to call the API now
//! - [`gateway::resolve`]: which gateway URL to talk to
//!
//! ```text
//!  Environment ──► CredentialStore ──load──► CredentialRecord
//!                                               │
//!                        armed::evaluate ◄──────┤
//!                        gateway::resolve ◄─────┘
//! ```

#![forbid(unsafe_code)]

pub mod armed;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod keyring_backend;
pub mod record;
pub mod store;

pub use armed::{ArmedState, NotArmedReason, evaluate};
pub use environment::Environment;
pub use error::{Error, Result};
pub use gateway::UrlSource;
pub use keyring_backend::KeyringBackend;
pub use record::CredentialRecord;
pub use store::{Backend, CredentialStore};
