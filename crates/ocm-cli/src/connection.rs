//! Authenticated session with the gateway.
//!
//! Opening a connection checks that the saved credentials are armed, makes
//! sure there is a usable access token (exchanging a grant at the token
//! endpoint when there isn't) and saves the rotated tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ocm_auth::{ACCESS_TOKEN_MARGIN, REFRESH_TOKEN_MARGIN};
use ocm_config::gateway::{self, DEFAULT_CLIENT_ID, DEFAULT_SCOPES};
use ocm_config::{ArmedState, CredentialRecord};
use serde::Deserialize;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::CliError;

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth grant used to obtain a new access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Exchange a refresh or offline token.
    RefreshToken(String),
    /// Service account credentials.
    ClientCredentials,
    /// Deprecated user name and password.
    Password,
}

impl Grant {
    /// Picks the grant for `record`: a usable refresh token first, then
    /// client credentials, then the password.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored refresh token is malformed.
    pub fn select(record: &CredentialRecord, now: DateTime<Utc>) -> Result<Option<Self>, CliError> {
        if !record.refresh_token.is_empty()
            && ocm_auth::is_usable(&record.refresh_token, REFRESH_TOKEN_MARGIN, now)?
        {
            return Ok(Some(Self::RefreshToken(record.refresh_token.clone())));
        }
        if record.has_client_credentials() {
            return Ok(Some(Self::ClientCredentials));
        }
        if record.has_password() {
            return Ok(Some(Self::Password));
        }
        Ok(None)
    }

    /// The `grant_type` form value.
    #[must_use]
    pub const fn grant_type(&self) -> &'static str {
        match self {
            Self::RefreshToken(_) => "refresh_token",
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
        }
    }

    /// Builds the form posted to the token endpoint.
    #[must_use]
    pub fn form(&self, record: &CredentialRecord) -> Vec<(&'static str, String)> {
        let client_id = if record.client_id.is_empty() {
            DEFAULT_CLIENT_ID
        } else {
            record.client_id.as_str()
        };
        let mut form = vec![
            ("grant_type", self.grant_type().to_string()),
            ("client_id", client_id.to_string()),
        ];
        if !record.client_secret.is_empty() {
            form.push(("client_secret", record.client_secret.clone()));
        }
        match self {
            Self::RefreshToken(token) => form.push(("refresh_token", token.clone())),
            Self::ClientCredentials => {}
            Self::Password => {
                form.push(("username", record.user.clone()));
                form.push(("password", record.password.clone()));
            }
        }
        if !matches!(self, Self::RefreshToken(_)) {
            form.push(("scope", scopes(record).join(" ")));
        }
        form
    }
}

fn scopes(record: &CredentialRecord) -> Vec<String> {
    if record.scopes.is_empty() {
        DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
    } else {
        record.scopes.clone()
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// New access token.
    pub access_token: String,
    /// New refresh token, when the server rotates it.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Error body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// An authenticated session with the gateway.
#[derive(Debug)]
pub struct Connection {
    client: reqwest::Client,
    url: String,
    access_token: String,
}

impl Connection {
    /// Opens a session using the saved credentials.
    ///
    /// `url_override` takes precedence over the saved gateway URL. Tokens
    /// obtained from the token endpoint are saved before returning.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotArmed`] if the credentials can't be used, or an
    /// error if the token exchange or saving the tokens fails.
    pub async fn open(
        ctx: &mut Context,
        url_override: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, CliError> {
        let mut record = ctx.record().cloned().unwrap_or_default();
        if let ArmedState::NotArmed(reason) = record.armed(now)? {
            return Err(reason.into());
        }

        let url = gateway::resolve(url_override.unwrap_or_default(), Some(&record))?;
        let token_url = gateway::resolve_token_url("", Some(&record))?;
        let client = build_client(record.insecure)?;

        let access_usable = !record.access_token.is_empty()
            && ocm_auth::is_usable(&record.access_token, ACCESS_TOKEN_MARGIN, now)?;
        if !access_usable {
            let grant = Grant::select(&record, now)?.ok_or_else(|| {
                CliError::Auth("no usable refresh token or credentials".to_string())
            })?;
            let response = exchange(&client, &token_url, &grant, &record).await?;
            record.access_token = response.access_token;
            if let Some(refresh) = response.refresh_token.filter(|t| !t.is_empty()) {
                record.refresh_token = refresh;
            }
            ctx.replace(record.clone());
            ctx.save()?;
            info!(grant = grant.grant_type(), "obtained new access token");
        }

        Ok(Self {
            client,
            url,
            access_token: record.access_token,
        })
    }

    /// The gateway URL requests go to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The access token sent with every request.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Sends an authenticated GET request and returns the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status isn't a success.
    pub async fn get(&self, path: &str) -> Result<serde_json::Value, CliError> {
        let target = request_url(&self.url, path)?;
        debug!(%target, "sending GET request");
        let response = self
            .client
            .get(&target)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body
            };
            return Err(CliError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| CliError::Format(format!("response isn't JSON: {e}")))
    }
}

fn build_client(insecure: bool) -> Result<reqwest::Client, CliError> {
    let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);
    if insecure {
        debug!("TLS verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }
    Ok(builder.build()?)
}

async fn exchange(
    client: &reqwest::Client,
    token_url: &str,
    grant: &Grant,
    record: &CredentialRecord,
) -> Result<TokenResponse, CliError> {
    debug!(%token_url, grant = grant.grant_type(), "requesting tokens");
    let response = client
        .post(token_url)
        .form(&grant.form(record))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CliError::Auth(token_error_message(status.as_u16(), &body)));
    }
    Ok(response.json().await?)
}

fn token_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<TokenError>(body) {
        Ok(TokenError {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(TokenError { error, .. }) => error,
        Err(_) if body.is_empty() => format!("token endpoint returned status {status}"),
        Err(_) => format!("token endpoint returned status {status}: {body}"),
    }
}

/// Joins the gateway URL and an API path.
///
/// `h2c` URLs are sent as plain HTTP. Unix socket URLs aren't supported by
/// this transport.
fn request_url(base: &str, path: &str) -> Result<String, CliError> {
    let base = match base.split_once("://") {
        Some(("http" | "https", _)) => base.to_string(),
        Some(("h2c", rest)) => format!("http://{rest}"),
        Some((scheme, _)) => {
            return Err(CliError::Connection(format!(
                "the '{scheme}' scheme isn't supported by this client"
            )));
        }
        None => return Err(CliError::InvalidArgument(format!("'{base}' isn't a URL"))),
    };
    let path = path.trim_start_matches('/');
    Ok(format!("{}/{path}", base.trim_end_matches('/')))
}
