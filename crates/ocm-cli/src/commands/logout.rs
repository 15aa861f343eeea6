//! `logout` command implementation.

use std::io::Write;

use tracing::debug;

use crate::context::Context;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Handler for `logout`.
#[derive(Debug, Default)]
pub struct LogoutCommand;

impl LogoutCommand {
    /// Creates a new logout command handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Forgets the saved tokens and credentials. URLs and preferences stay.
    ///
    /// # Errors
    ///
    /// Returns an error if the record can't be saved.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        ctx: &mut Context,
    ) -> Result<(), CliError> {
        let Some(record) = ctx.record() else {
            debug!("nothing saved, nothing to forget");
            return format.write(out, &Message::info("Not logged in"));
        };
        if !record.has_tokens() && !record.has_password() && !record.has_client_credentials() {
            return format.write(out, &Message::info("Not logged in"));
        }

        ctx.record_mut().clear_credentials();
        ctx.save()?;
        format.write(out, &Message::success("Logged out"))
    }
}
