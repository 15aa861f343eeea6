//! CLI command implementations.
//!
//! Each submodule implements one command:
//! - [`login`] - Save credentials and obtain tokens
//! - [`logout`] - Forget tokens and credentials
//! - [`token`] - Print the current token
//! - [`config`] - Inspect and edit settings
//! - [`get`] - Authenticated GET against the gateway

pub mod config;
pub mod get;
pub mod login;
pub mod logout;
pub mod token;

pub use config::ConfigCommand;
pub use get::GetCommand;
pub use login::LoginCommand;
pub use logout::LogoutCommand;
pub use token::TokenCommand;
