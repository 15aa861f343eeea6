//! `get` command implementation.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::GetArgs;
use crate::connection::Connection;
use crate::context::Context;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay, pretty_json};

/// Handler for `get`.
pub struct GetCommand {
    now: DateTime<Utc>,
}

impl GetCommand {
    /// Creates a new get command handler evaluating tokens at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Sends an authenticated GET request and prints the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if no session can be opened or the request fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        ctx: &mut Context,
        args: &GetArgs,
    ) -> Result<(), CliError> {
        let url_override = ctx.env().url_override().map(str::to_string);
        let connection = Connection::open(ctx, url_override.as_deref(), self.now).await?;
        let body = connection.get(&args.path).await?;
        format.write(out, &ApiResponse(body))
    }
}

// Output types

/// A JSON response body.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ApiResponse(
    /// Response body, `Null` when empty.
    pub serde_json::Value,
);

impl TableDisplay for ApiResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_null() {
            return Ok(());
        }
        writeln!(writer, "{}", pretty_json(&self.0)?)?;
        Ok(())
    }
}
