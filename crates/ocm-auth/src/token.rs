//! Token inspection.
//!
//! This module reads the metadata of the tokens issued by the SSO server
//! without verifying them; the server that receives the token does that.
//!
//! - [`classify`]: tells signed tokens (three segments) from encrypted ones (five segments)
//! - [`parse_claims`]: decodes the claim set of a signed token
//! - [`TokenType`]: the closed set of `typ` values the tool understands
//! - [`is_usable`]: decides if a token still has enough validity left

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, Result};

/// Minimum validity an access token needs to be used for a request.
pub const ACCESS_TOKEN_MARGIN: Duration = Duration::seconds(5);

/// Minimum validity a refresh token needs to be exchanged for an access token.
///
/// Longer than [`ACCESS_TOKEN_MARGIN`] because the exchange itself is a round trip.
pub const REFRESH_TOKEN_MARGIN: Duration = Duration::seconds(10);

const SIGNED_SEGMENTS: usize = 3;
const ENCRYPTED_SEGMENTS: usize = 5;

/// The two shapes a token string can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenShape {
    /// Three segments, claims readable without a key.
    Signed,
    /// Five segments, claims only readable by the recipient.
    Encrypted,
}

/// Role of a token, derived from its `typ` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenType {
    /// `Bearer`, or no `typ` claim at all.
    Access,
    /// `Refresh` or `Offline`.
    Refresh,
    /// Any other value.
    Unknown(String),
}

impl TokenType {
    /// Maps the raw `typ` claim to a token type.
    #[must_use]
    pub fn from_claim(typ: &str) -> Self {
        match typ {
            "" | "Bearer" => Self::Access,
            "Refresh" | "Offline" => Self::Refresh,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
            Self::Unknown(typ) => write!(f, "{typ}"),
        }
    }
}

/// How long a token remains valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// No `exp` claim, or `exp` is zero.
    Never,
    /// Time left until expiry; negative once the token has expired.
    In(Duration),
}

impl Expiration {
    /// Returns `true` if the token has an expiry time.
    #[must_use]
    pub const fn expires(&self) -> bool {
        matches!(self, Self::In(_))
    }

    /// Returns the remaining validity, if the token expires.
    #[must_use]
    pub const fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::In(remaining) => Some(*remaining),
        }
    }
}

/// Claim set of a signed token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Returns a claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the raw `typ` claim, or an empty string if it is absent or not a string.
    #[must_use]
    pub fn raw_type(&self) -> &str {
        self.0.get("typ").and_then(Value::as_str).unwrap_or_default()
    }

    /// Returns the token type declared by the `typ` claim.
    #[must_use]
    pub fn token_type(&self) -> TokenType {
        TokenType::from_claim(self.raw_type())
    }

    /// Returns the expiry time from the `exp` claim, `None` if the token never expires.
    ///
    /// Values past the range of [`DateTime`] are clamped to its bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `exp` is present but not a number.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(exp) = self.0.get("exp") else {
            return Ok(None);
        };
        let seconds = exp
            .as_f64()
            .ok_or_else(|| Error::invalid(format!("exp claim isn't a number: {exp}")))?;
        if seconds == 0.0 {
            return Ok(None);
        }
        // `as` saturates, so huge values land outside the range and are clamped.
        let millis = (seconds * 1000.0).round() as i64;
        let expires_at = DateTime::from_timestamp_millis(millis).unwrap_or(if seconds > 0.0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        });
        Ok(Some(expires_at))
    }

    /// Computes the remaining validity relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `exp` claim is malformed.
    pub fn expiration(&self, now: DateTime<Utc>) -> Result<Expiration> {
        Ok(match self.expires_at()? {
            None => Expiration::Never,
            Some(exp) => Expiration::In(exp - now),
        })
    }

    /// Returns the claims as a JSON map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The parts of a token, decoded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedToken {
    /// Shape of the token.
    #[serde(skip)]
    pub shape: TokenShape,
    /// Decoded header.
    pub header: Map<String, Value>,
    /// Decoded claims; `None` for encrypted tokens.
    pub claims: Option<Claims>,
    /// Raw signature segment; `None` for encrypted tokens.
    pub signature: Option<String>,
}

#[derive(Deserialize)]
struct EncryptedHeader {
    #[serde(default)]
    enc: String,
    #[serde(default)]
    cty: String,
}

/// Classifies a token string.
///
/// A token is encrypted when it has five segments and its header declares
/// an `enc` algorithm with a `JWT` content type. Everything else is treated
/// as signed, and fails later if it isn't.
#[must_use]
pub fn classify(token: &str) -> TokenShape {
    if is_encrypted(token) {
        TokenShape::Encrypted
    } else {
        TokenShape::Signed
    }
}

/// Returns `true` if the token is an encrypted token.
#[must_use]
pub fn is_encrypted(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != ENCRYPTED_SEGMENTS {
        return false;
    }
    decode_encrypted_header(segments[0])
        .and_then(|bytes| serde_json::from_slice::<EncryptedHeader>(&bytes).ok())
        .is_some_and(|header| !header.enc.is_empty() && header.cty == "JWT")
}

/// Parses the claims of a signed token without verifying its signature.
///
/// # Errors
///
/// Returns an error if the token doesn't have three segments or the claims
/// segment isn't a base64url encoded JSON object.
pub fn parse_claims(token: &str) -> Result<Claims> {
    let segments = signed_segments(token)?;
    let claims = decode_segment(segments[1], "claims")?;
    trace!(claims = claims.len(), "parsed token claims");
    Ok(Claims(claims))
}

/// Extracts the token type from a claim set.
#[must_use]
pub fn extract_type(claims: &Claims) -> TokenType {
    claims.token_type()
}

/// Decides if a token is still usable with at least `margin` of validity left.
///
/// Encrypted tokens are always considered usable: their expiry can't be read,
/// and the server will reject them if they have expired.
///
/// # Errors
///
/// Returns an error if the token is not encrypted and can't be parsed.
pub fn is_usable(token: &str, margin: Duration, now: DateTime<Utc>) -> Result<bool> {
    if is_encrypted(token) {
        return Ok(true);
    }
    let usable = match parse_claims(token)?.expiration(now)? {
        Expiration::Never => true,
        Expiration::In(remaining) => remaining >= margin,
    };
    Ok(usable)
}

/// Determines which slot of the credentials a token given to `login` belongs to.
///
/// Encrypted tokens are always offline tokens. Signed tokens are dispatched on
/// their `typ` claim.
///
/// # Errors
///
/// Returns an error if the token can't be parsed or its type is unknown.
pub fn token_role(token: &str) -> Result<TokenType> {
    if is_encrypted(token) {
        return Ok(TokenType::Refresh);
    }
    match parse_claims(token)?.token_type() {
        TokenType::Unknown(token_type) => Err(Error::UnsupportedTokenType { token_type }),
        known => Ok(known),
    }
}

/// Decodes the parts of a token for display.
///
/// # Errors
///
/// Returns an error if a signed token is malformed.
pub fn decode(token: &str) -> Result<DecodedToken> {
    if is_encrypted(token) {
        let first = token.split('.').next().unwrap_or_default();
        let header = decode_encrypted_header(first)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default();
        return Ok(DecodedToken {
            shape: TokenShape::Encrypted,
            header,
            claims: None,
            signature: None,
        });
    }
    let segments = signed_segments(token)?;
    Ok(DecodedToken {
        shape: TokenShape::Signed,
        header: decode_segment(segments[0], "header")?,
        claims: Some(Claims(decode_segment(segments[1], "claims")?)),
        signature: Some(segments[2].to_string()),
    })
}

fn signed_segments(token: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != SIGNED_SEGMENTS {
        return Err(Error::invalid(format!(
            "expected {SIGNED_SEGMENTS} segments, got {}",
            segments.len()
        )));
    }
    Ok(segments)
}

fn decode_segment(segment: &str, what: &str) -> Result<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| Error::invalid(format!("can't decode {what}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::invalid(format!("can't parse {what}: {e}")))
}

// The encrypted header is decoded with the standard alphabet, padded by hand.
fn decode_encrypted_header(segment: &str) -> Option<Vec<u8>> {
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    STANDARD.decode(padded).ok()
}
