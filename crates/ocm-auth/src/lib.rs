//! # ocm-auth
//!
//! Token inspection for the OCM command-line client.
//!
//! The SSO server hands out three kinds of tokens: short lived access
//! (`Bearer`) tokens, refresh (`Refresh`/`Offline`) tokens, and encrypted
//! offline tokens whose claims can't be read by the client. This crate reads
//! just enough of a token to decide what it is and whether it is still worth
//! sending:
//!
//! - [`token::classify`]: signed vs. encrypted
//! - [`token::parse_claims`]: the claim set of a signed token, unverified
//! - [`token::TokenType`]: `typ` claim dispatch
//! - [`token::is_usable`]: expiry check with a safety margin

#![forbid(unsafe_code)]

pub mod error;
pub mod token;

pub use error::{Error, Result};
pub use token::{
    ACCESS_TOKEN_MARGIN, Claims, DecodedToken, Expiration, REFRESH_TOKEN_MARGIN, TokenShape,
    TokenType, classify, decode, extract_type, is_encrypted, is_usable, parse_claims, token_role,
};
