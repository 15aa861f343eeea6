//! # ocm-cli
//!
//! The `ocm` command-line client.
//!
//! Provides commands for:
//! - Logging in with a token, client credentials or a user and password
//! - Printing and decoding the current token
//! - Editing the saved settings
//! - Sending authenticated requests to the gateway
//!
//! # Architecture
//!
//! Every command runs against a [`context::Context`] holding the credential
//! store and the record loaded from it. Commands that talk to the gateway
//! open a [`connection::Connection`], which refreshes the access token when
//! needed and saves the rotated tokens.
//!
//! ```text
//! ┌─────────┐  load/save  ┌─────────────────┐
//! │ Context │◄───────────►│ CredentialStore │
//! └────┬────┘             └─────────────────┘
//!      │ open
//! ┌────▼───────┐  token grant  ┌────────────────┐
//! │ Connection │──────────────►│ token endpoint │
//! └────┬───────┘               └────────────────┘
//!      │ GET
//!      ▼
//!   gateway
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod connection;
pub mod context;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, ConfigCommands, Format, GetArgs, LoginArgs, TokenArgs};
pub use connection::Connection;
pub use context::Context;
pub use error::CliError;
pub use output::OutputFormat;
