//! Decides whether the stored credentials are enough to call the API.

use std::fmt;

use chrono::{DateTime, Utc};
use ocm_auth::{ACCESS_TOKEN_MARGIN, REFRESH_TOKEN_MARGIN};
use tracing::debug;

use crate::error::Result;
use crate::record::CredentialRecord;

/// Why a credential record can't be used.
///
/// The messages are matched by scripts and must not change. The two URL
/// messages name the opposite field of the one that is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotArmedReason {
    /// Only an access token is stored, and it has expired.
    AccessTokenExpired,
    /// Only a refresh token is stored, and it has expired.
    RefreshTokenExpired,
    /// Both tokens are stored and both have expired.
    TokensExpired,
    /// No tokens and no credentials are stored.
    CredentialsNotSet,
    /// `url` is set but `token_url` isn't.
    ServerUrlNotSet,
    /// `token_url` is set but `url` isn't.
    TokenUrlNotSet,
    /// Neither URL is set.
    UrlsNotSet,
}

impl NotArmedReason {
    /// Returns the message shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AccessTokenExpired => "access token is expired",
            Self::RefreshTokenExpired => "refresh token is expired",
            Self::TokensExpired => "access and refresh tokens are expired",
            Self::CredentialsNotSet => "credentials aren't set",
            Self::ServerUrlNotSet => "server URL isn't set",
            Self::TokenUrlNotSet => "token URL isn't set",
            Self::UrlsNotSet => "server and token URLs aren't set",
        }
    }
}

impl fmt::Display for NotArmedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of evaluating a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmedState {
    /// An authenticated call can be attempted.
    Armed,
    /// It can't, for the given reason.
    NotArmed(NotArmedReason),
}

impl ArmedState {
    /// Returns `true` if an authenticated call can be attempted.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, Self::Armed)
    }

    /// Returns the reason the record can't be used.
    #[must_use]
    pub const fn reason(&self) -> Option<NotArmedReason> {
        match self {
            Self::Armed => None,
            Self::NotArmed(reason) => Some(*reason),
        }
    }

    /// Returns the reason as text, empty when armed.
    #[must_use]
    pub fn reason_text(&self) -> &'static str {
        self.reason().map_or("", NotArmedReason::message)
    }
}

/// Evaluates whether `record` can be used for an authenticated call at `now`.
///
/// Both URLs must be set, and at least one of: a user and password, a client
/// id and secret, an access token with 5 seconds left, or a refresh token
/// that is encrypted or has 10 seconds left.
///
/// # Errors
///
/// Returns an error if a stored signed token is malformed.
pub fn evaluate(record: &CredentialRecord, now: DateTime<Utc>) -> Result<ArmedState> {
    let have_url = !record.url.is_empty();
    let have_token_url = !record.token_url.is_empty();
    let have_credentials = record.has_password() || record.has_client_credentials();

    let have_access = !record.access_token.is_empty();
    let access_usable =
        have_access && ocm_auth::is_usable(&record.access_token, ACCESS_TOKEN_MARGIN, now)?;

    // Encrypted refresh tokens can't be inspected, is_usable accepts them.
    let have_refresh = !record.refresh_token.is_empty();
    let refresh_usable =
        have_refresh && ocm_auth::is_usable(&record.refresh_token, REFRESH_TOKEN_MARGIN, now)?;

    if have_url && have_token_url && (have_credentials || access_usable || refresh_usable) {
        return Ok(ArmedState::Armed);
    }

    let reason = if have_access && !access_usable && !have_refresh {
        NotArmedReason::AccessTokenExpired
    } else if have_refresh && !refresh_usable && !have_access {
        NotArmedReason::RefreshTokenExpired
    } else if have_access && !access_usable && have_refresh && !refresh_usable {
        NotArmedReason::TokensExpired
    } else if !have_credentials && !have_access && !have_refresh {
        NotArmedReason::CredentialsNotSet
    } else if have_url && !have_token_url {
        NotArmedReason::ServerUrlNotSet
    } else if !have_url && have_token_url {
        NotArmedReason::TokenUrlNotSet
    } else {
        NotArmedReason::UrlsNotSet
    };
    debug!(%reason, "credentials aren't armed");
    Ok(ArmedState::NotArmed(reason))
}

impl CredentialRecord {
    /// Evaluates whether this record can be used for an authenticated call.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored signed token is malformed.
    pub fn armed(&self, now: DateTime<Utc>) -> Result<ArmedState> {
        evaluate(self, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encrypted_token, now, signed_token};
    use chrono::Duration;
    use test_case::test_case;

    fn with_urls() -> CredentialRecord {
        CredentialRecord {
            url: "https://api.example.com".to_string(),
            token_url: "https://sso.example.com/token".to_string(),
            ..CredentialRecord::default()
        }
    }

    fn access(offset: Duration) -> String {
        signed_token("Bearer", Some(offset))
    }

    fn refresh(offset: Duration) -> String {
        signed_token("Refresh", Some(offset))
    }

    fn evaluate_now(record: &CredentialRecord) -> ArmedState {
        evaluate(record, now()).expect("evaluate")
    }

    // ===================
    // Armed Tests
    // ===================

    #[test]
    fn expired_access_with_valid_refresh_is_armed() {
        let record = CredentialRecord {
            access_token: access(Duration::minutes(-5)),
            refresh_token: refresh(Duration::hours(10)),
            ..with_urls()
        };
        let state = evaluate_now(&record);
        assert!(state.is_armed());
        assert_eq!(state.reason_text(), "");
    }

    #[test]
    fn valid_access_token_is_armed() {
        let record = CredentialRecord {
            access_token: access(Duration::minutes(5)),
            ..with_urls()
        };
        assert_eq!(evaluate_now(&record), ArmedState::Armed);
    }

    #[test]
    fn non_expiring_access_token_is_armed() {
        let record = CredentialRecord {
            access_token: signed_token("Bearer", None),
            ..with_urls()
        };
        assert_eq!(evaluate_now(&record), ArmedState::Armed);
    }

    #[test]
    fn encrypted_refresh_token_is_armed() {
        let record = CredentialRecord {
            refresh_token: encrypted_token(),
            ..with_urls()
        };
        assert_eq!(evaluate_now(&record), ArmedState::Armed);
    }

    #[test]
    fn client_credentials_are_armed() {
        let record = CredentialRecord {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..with_urls()
        };
        assert_eq!(evaluate_now(&record), ArmedState::Armed);
    }

    #[test]
    fn password_is_armed() {
        let record = CredentialRecord {
            user: "alice".to_string(),
            password: "hunter2".to_string(),
            ..with_urls()
        };
        assert_eq!(evaluate_now(&record), ArmedState::Armed);
    }

    #[test]
    fn half_credentials_are_not_armed() {
        let record = CredentialRecord {
            client_id: "id".to_string(),
            user: "alice".to_string(),
            ..with_urls()
        };
        assert_eq!(
            evaluate_now(&record),
            ArmedState::NotArmed(NotArmedReason::CredentialsNotSet)
        );
    }

    #[test]
    fn access_token_inside_margin_is_not_usable() {
        let record = CredentialRecord {
            access_token: access(Duration::seconds(3)),
            ..with_urls()
        };
        assert_eq!(
            evaluate_now(&record),
            ArmedState::NotArmed(NotArmedReason::AccessTokenExpired)
        );
    }

    #[test]
    fn refresh_token_uses_longer_margin() {
        let record = CredentialRecord {
            refresh_token: refresh(Duration::seconds(8)),
            ..with_urls()
        };
        assert_eq!(
            evaluate_now(&record),
            ArmedState::NotArmed(NotArmedReason::RefreshTokenExpired)
        );
    }

    // ===================
    // Reason Ladder Tests
    // ===================

    #[test]
    fn expired_access_without_refresh() {
        let record = CredentialRecord {
            access_token: access(Duration::minutes(-5)),
            ..with_urls()
        };
        let state = evaluate_now(&record);
        assert!(!state.is_armed());
        assert_eq!(state.reason_text(), "access token is expired");
    }

    #[test]
    fn expired_refresh_without_access() {
        let record = CredentialRecord {
            refresh_token: refresh(Duration::minutes(-5)),
            ..with_urls()
        };
        assert_eq!(evaluate_now(&record).reason_text(), "refresh token is expired");
    }

    #[test]
    fn both_tokens_expired() {
        let record = CredentialRecord {
            access_token: access(Duration::minutes(-5)),
            refresh_token: refresh(Duration::minutes(-1)),
            ..with_urls()
        };
        assert_eq!(
            evaluate_now(&record).reason_text(),
            "access and refresh tokens are expired"
        );
    }

    #[test]
    fn empty_record() {
        let state = evaluate_now(&CredentialRecord::default());
        assert!(!state.is_armed());
        assert_eq!(state.reason_text(), "credentials aren't set");
    }

    #[test_case("https://api.example.com", "", "server URL isn't set" ; "token url missing")]
    #[test_case("", "https://sso.example.com/token", "token URL isn't set" ; "url missing")]
    #[test_case("", "", "server and token URLs aren't set" ; "both missing")]
    fn missing_urls(url: &str, token_url: &str, expected: &str) {
        let record = CredentialRecord {
            url: url.to_string(),
            token_url: token_url.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            ..CredentialRecord::default()
        };
        assert_eq!(evaluate_now(&record).reason_text(), expected);
    }

    #[test]
    fn credentials_reported_before_urls() {
        let state = evaluate_now(&CredentialRecord {
            url: "https://api.example.com".to_string(),
            ..CredentialRecord::default()
        });
        assert_eq!(state.reason(), Some(NotArmedReason::CredentialsNotSet));
    }

    #[test]
    fn valid_tokens_without_urls() {
        let record = CredentialRecord {
            access_token: access(Duration::hours(1)),
            ..CredentialRecord::default()
        };
        assert_eq!(
            evaluate_now(&record).reason(),
            Some(NotArmedReason::UrlsNotSet)
        );
    }

    #[test]
    fn malformed_token_is_an_error() {
        let record = CredentialRecord {
            access_token: "garbage".to_string(),
            ..with_urls()
        };
        assert!(evaluate(&record, now()).is_err());
    }

    #[test]
    fn record_armed_delegates() {
        let record = CredentialRecord {
            access_token: access(Duration::minutes(-5)),
            ..with_urls()
        };
        assert_eq!(
            record.armed(now()).expect("armed").reason(),
            Some(NotArmedReason::AccessTokenExpired)
        );
    }
}
