//! HS256 bearer tokens.

use crate::error::AuthenticationError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use timetalker_core::{Result, UserId};

/// Signed token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user_id: UserId,
    username: String,
    expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Returns the token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs a token for `user_id`, valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `TokenIssueFailed` if signing fails or the expiry is out of
    /// range.
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<IssuedToken, AuthenticationError> {
        let now = Utc::now();
        let expires_at =
            now.checked_add_signed(self.ttl)
                .ok_or_else(|| AuthenticationError::TokenIssueFailed {
                    reason: "token lifetime out of range".to_string(),
                })?;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthenticationError::TokenIssueFailed {
                reason: e.to_string(),
            })?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` for an expired token and `InvalidToken` for
    /// anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthenticationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthenticationError::TokenExpired,
                _ => AuthenticationError::InvalidToken {
                    reason: e.to_string(),
                },
            },
        )?;
        let claims = data.claims;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|e| AuthenticationError::InvalidToken {
                reason: e.to_string(),
            })?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthenticationError::InvalidToken {
                reason: "expiry out of range".to_string(),
            })?;

        Ok(AuthenticatedUser {
            user_id,
            username: claims.username,
            expires_at,
        })
    }
}
