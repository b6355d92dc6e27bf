//! Error types for the platform-access crate.

use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Unknown user or wrong password.
    InvalidCredentials,
    /// The account has been deactivated.
    InactiveAccount,
    /// No bearer token was presented.
    MissingToken,
    /// Token signature or structure is invalid.
    InvalidToken { reason: String },
    /// Token has expired.
    TokenExpired,
    /// Signing a new token failed.
    TokenIssueFailed { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::InactiveAccount => write!(f, "account is deactivated"),
            Self::MissingToken => write!(f, "missing bearer token"),
            Self::InvalidToken { reason } => {
                write!(f, "invalid token: {reason}")
            }
            Self::TokenExpired => {
                write!(f, "token has expired")
            }
            Self::TokenIssueFailed { reason } => {
                write!(f, "failed to issue token: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}
