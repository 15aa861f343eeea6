//! Error types for token inspection.

use thiserror::Error;

/// Errors that can occur while inspecting a token.
#[derive(Debug, Error)]
pub enum Error {
    /// The token is not a well-formed signed token, or its claims can't be read.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// The reason the token is invalid.
        reason: String,
    },

    /// The token declares a `typ` claim this tool doesn't know how to store.
    #[error("don't know how to handle token type '{token_type}' in token")]
    UnsupportedTokenType {
        /// The value of the `typ` claim.
        token_type: String,
    },
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }
}

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
