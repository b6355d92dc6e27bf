//! Authentication extractors for Axum.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use std::sync::Arc;
use timetalker_platform_access::AuthenticatedUser;

/// Extractor for requiring a valid bearer token.
///
/// Only the token is checked; the user row is not loaded.
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthRejection::MissingToken)?;

        match app_state.tokens.verify(bearer.token()) {
            Ok(user) => Ok(RequireAuth(user)),
            Err(report) => {
                tracing::debug!(error = %report, "rejected bearer token");
                Err(AuthRejection::InvalidToken)
            }
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// Bad signature, malformed or expired token.
    InvalidToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Not authenticated",
            Self::InvalidToken => "Invalid or expired token",
        };
        ApiError::unauthorized(message).into_response()
    }
}
