//! The persisted credential record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Names of the settings that `config get/set/delete` accept, in file order.
pub const SETTINGS: &[&str] = &[
    "access_token",
    "client_id",
    "client_secret",
    "insecure",
    "password",
    "refresh_token",
    "scopes",
    "token_url",
    "url",
    "user",
    "pager",
];

/// Everything the CLI knows about how to authenticate.
///
/// Empty strings mean "not set". Empty values are omitted from the
/// serialized form and missing fields read back as empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Bearer token sent with each request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    /// Client identifier of a service account.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    /// Client secret of a service account.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    /// Disables TLS certificate verification.
    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure: bool,
    /// Password for the deprecated password grant.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Refresh or offline token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// OAuth scopes requested when exchanging tokens.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// OpenID token endpoint.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_url: String,
    /// Gateway URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// User name for the deprecated password grant.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Pager used to display long output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pager: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl CredentialRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a user name and password are both set.
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }

    /// Returns `true` if a client id and secret are both set.
    #[must_use]
    pub fn has_client_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Returns `true` if any token is stored.
    #[must_use]
    pub fn has_tokens(&self) -> bool {
        !self.access_token.is_empty() || !self.refresh_token.is_empty()
    }

    /// Forgets every token and credential, keeping URLs and preferences.
    pub fn clear_credentials(&mut self) {
        self.access_token.clear();
        self.refresh_token.clear();
        self.client_id.clear();
        self.client_secret.clear();
        self.user.clear();
        self.password.clear();
    }

    /// Returns the value of a setting as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting doesn't exist.
    pub fn setting(&self, name: &str) -> Result<String> {
        let value = match name {
            "access_token" => self.access_token.clone(),
            "client_id" => self.client_id.clone(),
            "client_secret" => self.client_secret.clone(),
            "insecure" => self.insecure.to_string(),
            "password" => self.password.clone(),
            "refresh_token" => self.refresh_token.clone(),
            "scopes" => self.scopes.join(","),
            "token_url" => self.token_url.clone(),
            "url" => self.url.clone(),
            "user" => self.user.clone(),
            "pager" => self.pager.clone(),
            _ => return Err(unknown_setting(name)),
        };
        Ok(value)
    }

    /// Sets a setting from text. Scopes are comma separated.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting doesn't exist or the value is invalid.
    pub fn set_setting(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "insecure" => {
                self.insecure = value.parse().map_err(|_| Error::InvalidSetting {
                    name: name.to_string(),
                    reason: format!("expected 'true' or 'false', got '{value}'"),
                })?;
            }
            "scopes" => {
                self.scopes = value
                    .split(',')
                    .map(str::trim)
                    .filter(|scope| !scope.is_empty())
                    .map(String::from)
                    .collect();
            }
            _ => *self.text_field(name)? = value.to_string(),
        }
        Ok(())
    }

    /// Resets a setting to its empty value.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting doesn't exist.
    pub fn delete_setting(&mut self, name: &str) -> Result<()> {
        match name {
            "insecure" => self.insecure = false,
            "scopes" => self.scopes.clear(),
            _ => self.text_field(name)?.clear(),
        }
        Ok(())
    }

    fn text_field(&mut self, name: &str) -> Result<&mut String> {
        Ok(match name {
            "access_token" => &mut self.access_token,
            "client_id" => &mut self.client_id,
            "client_secret" => &mut self.client_secret,
            "password" => &mut self.password,
            "refresh_token" => &mut self.refresh_token,
            "token_url" => &mut self.token_url,
            "url" => &mut self.url,
            "user" => &mut self.user,
            "pager" => &mut self.pager,
            _ => return Err(unknown_setting(name)),
        })
    }
}

fn unknown_setting(name: &str) -> Error {
    Error::UnknownSetting {
        name: name.to_string(),
        valid: SETTINGS.join(", "),
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &str {
            if value.is_empty() { "" } else { "[REDACTED]" }
        }
        f.debug_struct("CredentialRecord")
            .field("access_token", &redact(&self.access_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("insecure", &self.insecure)
            .field("password", &redact(&self.password))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("scopes", &self.scopes)
            .field("token_url", &self.token_url)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pager", &self.pager)
            .finish()
    }
}
