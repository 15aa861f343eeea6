//! Gateway and token URL resolution.

use std::fmt;

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::record::CredentialRecord;

/// Gateway used when nothing else is configured.
pub const DEFAULT_URL: &str = "https://api.openshift.com";

/// Token endpoint used when nothing else is configured.
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

/// Client id used for token exchanges when none is configured.
pub const DEFAULT_CLIENT_ID: &str = "cloud-services";

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &["openid"];

/// Short names accepted in place of a gateway URL.
pub const URL_ALIASES: &[(&str, &str)] = &[
    ("production", "https://api.openshift.com"),
    ("prod", "https://api.openshift.com"),
    ("staging", "https://api.stage.openshift.com"),
    ("stage", "https://api.stage.openshift.com"),
    ("integration", "https://api.integration.openshift.com"),
    ("int", "https://api.integration.openshift.com"),
];

/// Schemes used by the transport to talk through a unix socket or HTTP/2
/// without TLS.
const SOCKET_SCHEMES: &[&str] = &["unix", "unix+https", "h2c", "unix+h2c"];

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    /// The command line or the `OCM_URL` override.
    Flag,
    /// The persisted credential record.
    Config,
    /// The compiled-in default.
    Default,
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "flag"),
            Self::Config => write!(f, "config"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Looks up a URL alias. Matching is exact and case sensitive.
#[must_use]
pub fn alias(name: &str) -> Option<&'static str> {
    URL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, url)| *url)
}

/// Resolves the gateway URL.
///
/// Precedence: an alias given as override, the override verbatim, the
/// persisted URL, the default.
///
/// # Errors
///
/// Returns an error if the chosen value isn't an absolute URL.
pub fn resolve(override_value: &str, persisted: Option<&CredentialRecord>) -> Result<String> {
    resolve_with_source(override_value, persisted).map(|(url, _)| url)
}

/// Resolves the gateway URL and reports where it came from.
///
/// # Errors
///
/// Returns an error if the chosen value isn't an absolute URL.
pub fn resolve_with_source(
    override_value: &str,
    persisted: Option<&CredentialRecord>,
) -> Result<(String, UrlSource)> {
    let persisted_url = persisted.map(|record| record.url.as_str());
    let (url, source) = pick(override_value, persisted_url, DEFAULT_URL, true);
    validate(&url, source)?;
    debug!(%url, %source, "resolved gateway URL");
    Ok((url, source))
}

/// Resolves the token endpoint, with the same precedence as the gateway
/// URL but without aliases.
///
/// # Errors
///
/// Returns an error if the chosen value isn't an absolute URL.
pub fn resolve_token_url(
    override_value: &str,
    persisted: Option<&CredentialRecord>,
) -> Result<String> {
    let persisted_url = persisted.map(|record| record.token_url.as_str());
    let (url, source) = pick(override_value, persisted_url, DEFAULT_TOKEN_URL, false);
    validate(&url, source)?;
    debug!(%url, %source, "resolved token URL");
    Ok(url)
}

fn pick(
    override_value: &str,
    persisted: Option<&str>,
    default: &str,
    with_aliases: bool,
) -> (String, UrlSource) {
    if with_aliases {
        if let Some(url) = alias(override_value) {
            return (url.to_string(), UrlSource::Flag);
        }
    }
    if !override_value.is_empty() {
        return (override_value.to_string(), UrlSource::Flag);
    }
    match persisted.filter(|url| !url.is_empty()) {
        Some(url) => (url.to_string(), UrlSource::Config),
        None => (default.to_string(), UrlSource::Default),
    }
}

/// Checks that `url` is an absolute URL with a host, or a socket URL.
///
/// # Errors
///
/// Returns an error naming `source` and listing the valid aliases.
pub fn validate(url: &str, source: UrlSource) -> Result<()> {
    let invalid = |reason: String| Error::InvalidUrl {
        origin: source,
        url: url.to_string(),
        reason,
        aliases: alias_names(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());
    let socket_path = SOCKET_SCHEMES.contains(&parsed.scheme()) && parsed.path().len() > 1;
    if !has_host && !socket_path {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(())
}

fn alias_names() -> String {
    URL_ALIASES
        .iter()
        .map(|(alias, _)| *alias)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn persisted(url: &str) -> CredentialRecord {
        CredentialRecord {
            url: url.to_string(),
            ..CredentialRecord::default()
        }
    }

    // ===================
    // Precedence Tests
    // ===================

    #[test_case("prod" ; "prod")]
    #[test_case("production" ; "production")]
    fn alias_beats_persisted(name: &str) {
        let record = persisted("https://x.example.com");
        assert_eq!(
            resolve(name, Some(&record)).ok().as_deref(),
            Some("https://api.openshift.com")
        );
        assert_eq!(
            resolve(name, None).ok().as_deref(),
            Some("https://api.openshift.com")
        );
    }

    #[test_case("staging", "https://api.stage.openshift.com" ; "staging")]
    #[test_case("stage", "https://api.stage.openshift.com" ; "stage")]
    #[test_case("integration", "https://api.integration.openshift.com" ; "integration")]
    #[test_case("int", "https://api.integration.openshift.com" ; "int")]
    fn aliases_map_to_gateways(name: &str, expected: &str) {
        assert_eq!(resolve(name, None).ok().as_deref(), Some(expected));
    }

    #[test]
    fn aliases_are_case_sensitive() {
        let result = resolve("PROD", None);
        assert!(matches!(result, Err(Error::InvalidUrl { origin: UrlSource::Flag, .. })));
    }

    #[test]
    fn override_used_verbatim() {
        let record = persisted("https://x.example.com");
        assert_eq!(
            resolve_with_source("https://y.example.com", Some(&record)).ok(),
            Some(("https://y.example.com".to_string(), UrlSource::Flag))
        );
    }

    #[test]
    fn persisted_used_without_override() {
        let record = persisted("https://x.example.com");
        assert_eq!(
            resolve_with_source("", Some(&record)).ok(),
            Some(("https://x.example.com".to_string(), UrlSource::Config))
        );
    }

    #[test]
    fn default_without_anything() {
        assert_eq!(
            resolve_with_source("", None).ok(),
            Some((DEFAULT_URL.to_string(), UrlSource::Default))
        );
        let empty = persisted("");
        assert_eq!(resolve("", Some(&empty)).ok().as_deref(), Some(DEFAULT_URL));
    }

    // ===================
    // Validation Tests
    // ===================

    #[test]
    fn not_a_url_is_rejected() {
        let result = resolve("not-a-url", None);
        assert!(matches!(result, Err(Error::InvalidUrl { origin: UrlSource::Flag, .. })));
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("production"));
        assert!(message.contains("flag URL 'not-a-url'"));
    }

    #[test]
    fn bad_persisted_url_names_config() {
        let record = persisted("api.example.com");
        assert!(matches!(
            resolve("", Some(&record)),
            Err(Error::InvalidUrl { origin: UrlSource::Config, .. })
        ));
    }

    #[test_case("https://api.example.com" ; "https")]
    #[test_case("http://localhost:8000" ; "http with port")]
    #[test_case("h2c://localhost:8000" ; "h2c")]
    #[test_case("unix://api.example.com/tmp/api.socket" ; "unix with host")]
    #[test_case("unix:///tmp/api.socket" ; "unix socket path")]
    #[test_case("unix+https://api.example.com/tmp/api.socket" ; "unix https")]
    #[test_case("unix+h2c:///tmp/api.socket" ; "unix h2c")]
    fn valid_urls(url: &str) {
        assert!(validate(url, UrlSource::Flag).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("localhost:8000" ; "no scheme")]
    #[test_case("https://" ; "no host")]
    #[test_case("mailto:someone@example.com" ; "opaque")]
    #[test_case("unix://" ; "unix without path")]
    fn invalid_urls(url: &str) {
        assert!(validate(url, UrlSource::Flag).is_err());
    }

    // ===================
    // Token URL Tests
    // ===================

    #[test]
    fn token_url_precedence() {
        let record = CredentialRecord {
            token_url: "https://sso.example.com/token".to_string(),
            ..CredentialRecord::default()
        };
        assert_eq!(
            resolve_token_url("", Some(&record)).ok().as_deref(),
            Some("https://sso.example.com/token")
        );
        assert_eq!(
            resolve_token_url("https://other.example.com/token", Some(&record)).ok().as_deref(),
            Some("https://other.example.com/token")
        );
        assert_eq!(resolve_token_url("", None).ok().as_deref(), Some(DEFAULT_TOKEN_URL));
    }

    #[test]
    fn token_url_has_no_aliases() {
        assert!(resolve_token_url("prod", None).is_err());
    }
}
