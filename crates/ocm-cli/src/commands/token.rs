//! `token` command implementation.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::TokenArgs;
use crate::connection::Connection;
use crate::context::Context;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay, pretty_json};

/// Handler for `token`.
pub struct TokenCommand {
    now: DateTime<Utc>,
}

impl TokenCommand {
    /// Creates a new token command handler evaluating tokens at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Prints the current token, refreshing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no session can be opened or the token can't be
    /// decoded.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        ctx: &mut Context,
        args: &TokenArgs,
    ) -> Result<(), CliError> {
        let url_override = ctx.env().url_override().map(str::to_string);
        let connection = Connection::open(ctx, url_override.as_deref(), self.now).await?;

        let token = if args.refresh {
            let refresh = ctx
                .record()
                .map(|record| record.refresh_token.clone())
                .unwrap_or_default();
            if refresh.is_empty() {
                return Err(CliError::InvalidArgument("no refresh token is saved".to_string()));
            }
            refresh
        } else {
            connection.access_token().to_string()
        };

        let output = TokenOutput::select(token, args)?;
        format.write(out, &output)
    }
}

// Output types

/// The token, or one of its decoded parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOutput {
    /// The raw token.
    Token(String),
    /// The decoded header.
    Header(Map<String, Value>),
    /// The decoded claims.
    Payload(Map<String, Value>),
    /// The signature segment.
    Signature(String),
}

impl TokenOutput {
    /// Picks the part of `token` requested by `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token can't be decoded or the part isn't
    /// readable.
    pub fn select(token: String, args: &TokenArgs) -> Result<Self, CliError> {
        if !args.header && !args.payload && !args.signature {
            return Ok(Self::Token(token));
        }
        let decoded = ocm_auth::decode(&token)?;
        if args.header {
            return Ok(Self::Header(decoded.header));
        }
        let opaque = || CliError::InvalidArgument("the token is encrypted, only its header is readable".to_string());
        if args.payload {
            let claims = decoded.claims.ok_or_else(opaque)?;
            return Ok(Self::Payload(claims.as_map().clone()));
        }
        decoded.signature.map(Self::Signature).ok_or_else(opaque)
    }
}

impl TableDisplay for TokenOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match self {
            Self::Token(text) | Self::Signature(text) => writeln!(writer, "{text}")?,
            Self::Header(map) | Self::Payload(map) => {
                writeln!(writer, "{}", pretty_json(map)?)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use ocm_config::{CredentialRecord, CredentialStore, Environment};
    use serde_json::json;

    use crate::cli::Format;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    fn signed(typ: &str, offset: Duration) -> String {
        let claims = json!({ "typ": typ, "exp": (now() + offset).timestamp(), "sub": "alice" });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
            .expect("sign token")
    }

    fn logged_in(dir: &tempfile::TempDir, record: &CredentialRecord) -> Context {
        let store = CredentialStore::file(dir.path().join("ocm.json"));
        store.save(record).expect("save");
        Context::with_store(Environment::default(), store).expect("context")
    }

    fn with_urls() -> CredentialRecord {
        CredentialRecord {
            url: "https://api.example.com".to_string(),
            token_url: "https://sso.example.com/token".to_string(),
            ..CredentialRecord::default()
        }
    }

    // ===================
    // Part Selection Tests
    // ===================

    #[test]
    fn select_raw_token() {
        let output = TokenOutput::select("t".to_string(), &TokenArgs::default()).expect("select");
        assert_eq!(output, TokenOutput::Token("t".to_string()));
    }

    #[test]
    fn select_header_and_payload() {
        let token = signed("Bearer", Duration::hours(1));
        let header = TokenOutput::select(
            token.clone(),
            &TokenArgs {
                header: true,
                ..TokenArgs::default()
            },
        )
        .expect("header");
        assert!(matches!(header, TokenOutput::Header(map) if map["alg"] == "HS256"));

        let payload = TokenOutput::select(
            token,
            &TokenArgs {
                payload: true,
                ..TokenArgs::default()
            },
        )
        .expect("payload");
        assert!(matches!(payload, TokenOutput::Payload(map) if map["sub"] == "alice"));
    }

    #[test]
    fn select_signature() {
        let token = signed("Bearer", Duration::hours(1));
        let expected = token.rsplit('.').next().unwrap_or_default().to_string();
        let output = TokenOutput::select(
            token,
            &TokenArgs {
                signature: true,
                ..TokenArgs::default()
            },
        )
        .expect("signature");
        assert_eq!(output, TokenOutput::Signature(expected));
    }

    #[test]
    fn json_output_is_tagged() {
        let fmt = OutputFormat::new(Format::Json);
        let output = fmt
            .to_string(&TokenOutput::Token("abc".to_string()))
            .expect("should format");
        let parsed: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed["token"], "abc");
    }

    // ===================
    // Execute Tests
    // ===================

    #[tokio::test]
    async fn prints_usable_access_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let access = signed("Bearer", Duration::hours(1));
        let mut ctx = logged_in(
            &dir,
            &CredentialRecord {
                access_token: access.clone(),
                ..with_urls()
            },
        );

        let mut out = Vec::new();
        TokenCommand::new(now())
            .execute(&mut out, &OutputFormat::default(), &mut ctx, &TokenArgs::default())
            .await
            .expect("token");
        assert_eq!(String::from_utf8(out).expect("utf8"), format!("{access}\n"));
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ctx = logged_in(
            &dir,
            &CredentialRecord {
                access_token: signed("Bearer", Duration::hours(1)),
                ..with_urls()
            },
        );
        let args = TokenArgs {
            refresh: true,
            ..TokenArgs::default()
        };

        let mut out = Vec::new();
        let result = TokenCommand::new(now())
            .execute(&mut out, &OutputFormat::default(), &mut ctx, &args)
            .await;
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn not_logged_in() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::file(dir.path().join("ocm.json"));
        let mut ctx = Context::with_store(Environment::default(), store).expect("context");

        let mut out = Vec::new();
        let result = TokenCommand::new(now())
            .execute(&mut out, &OutputFormat::default(), &mut ctx, &TokenArgs::default())
            .await;
        assert!(matches!(result, Err(CliError::NotArmed(_))));
        assert!(out.is_empty());
    }
}
