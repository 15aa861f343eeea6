//! `login` command implementation.

use std::io::Write;

use chrono::{DateTime, Utc};
use ocm_auth::TokenType;
use ocm_config::gateway::{self, DEFAULT_CLIENT_ID, DEFAULT_SCOPES};
use ocm_config::CredentialRecord;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::LoginArgs;
use crate::connection::Connection;
use crate::context::Context;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};

/// Handler for `login`.
pub struct LoginCommand {
    now: DateTime<Utc>,
}

impl LoginCommand {
    /// Creates a new login command handler evaluating tokens at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Executes the login.
    ///
    /// The saved record is replaced only after a session could be opened
    /// with the new credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are incomplete, a token can't be
    /// classified, or the credentials are rejected.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        ctx: &mut Context,
        args: &LoginArgs,
    ) -> Result<(), CliError> {
        if ctx.env().url_override().is_some() {
            warn!("ignoring the OCM_URL environment variable, use the --url option to log in to a different gateway");
        }

        let record = build_record(args, ctx.record())?;
        let previous = ctx.record().cloned();
        ctx.replace(record);

        if let Err(e) = Connection::open(ctx, None, self.now).await {
            if let Some(previous) = previous {
                ctx.replace(previous);
            }
            return Err(e);
        }
        ctx.save()?;

        let record = ctx.record().cloned().unwrap_or_default();
        let result = LoginResult {
            url: record.url,
            token_url: record.token_url,
            location: ctx.store().location(),
        };
        format.write(out, &result)
    }
}

/// Builds the record `login` saves, keeping only display preferences from
/// the previous one.
///
/// # Errors
///
/// Returns an error if no credentials are given, the token can't be
/// classified, or a URL is invalid.
pub fn build_record(
    args: &LoginArgs,
    previous: Option<&CredentialRecord>,
) -> Result<CredentialRecord, CliError> {
    let token = args.token.as_deref().unwrap_or_default();
    let client_id = args.client_id.as_deref().unwrap_or_default();
    let client_secret = args.client_secret.as_deref().unwrap_or_default();
    let user = args.user.as_deref().unwrap_or_default();
    let password = args.password.as_deref().unwrap_or_default();

    let have_client_credentials = !client_id.is_empty() && !client_secret.is_empty();
    let have_password = !user.is_empty() && !password.is_empty();
    if token.is_empty() && !have_client_credentials && !have_password {
        return Err(CliError::InvalidArgument(
            "a token, client credentials, or a user and password are required".to_string(),
        ));
    }

    let mut record = CredentialRecord {
        client_id: if client_id.is_empty() {
            DEFAULT_CLIENT_ID.to_string()
        } else {
            client_id.to_string()
        },
        client_secret: client_secret.to_string(),
        user: user.to_string(),
        password: password.to_string(),
        scopes: if args.scopes.is_empty() {
            DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
        } else {
            args.scopes.clone()
        },
        insecure: args.insecure,
        url: gateway::resolve(args.url.as_deref().unwrap_or_default(), None)?,
        token_url: gateway::resolve_token_url(args.token_url.as_deref().unwrap_or_default(), None)?,
        pager: previous.map(|p| p.pager.clone()).unwrap_or_default(),
        ..CredentialRecord::default()
    };

    if !token.is_empty() {
        match ocm_auth::token_role(token)? {
            TokenType::Access => record.access_token = token.to_string(),
            TokenType::Refresh => record.refresh_token = token.to_string(),
            TokenType::Unknown(token_type) => {
                return Err(ocm_auth::Error::UnsupportedTokenType { token_type }.into());
            }
        }
        debug!(
            access = !record.access_token.is_empty(),
            refresh = !record.refresh_token.is_empty(),
            "classified login token"
        );
    }
    Ok(record)
}

// Output types

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// Gateway URL.
    pub url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Where the credentials were saved.
    pub location: String,
}

impl TableDisplay for LoginResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ Logged in to {}", self.url)?;
        writeln!(writer, "  Token URL:  {}", self.token_url)?;
        writeln!(writer, "  Saved to:   {}", self.location)?;
        Ok(())
    }
}
