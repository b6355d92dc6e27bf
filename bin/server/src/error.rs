//! API error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The response body is always
//! `{"success": false, "message": "..."}`; internal details are logged and
//! never returned to the client.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use timetalker_persona::{PersonaError, SkillError};

/// Errors surfaced by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Unknown persona, user or setting.
    NotFound { message: String },
    /// Duplicate username or email.
    Conflict { message: String },
    /// Bad credentials or an invalid/expired token.
    Unauthorized { message: String },
    /// Missing or malformed input.
    Validation { message: String },
    /// The persona does not declare the skill.
    SkillUnsupported { message: String },
    /// The skill is declared but has no implementation.
    SkillNotImplemented { message: String },
    /// Storage or other infrastructure failure.
    Internal { details: String },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(details: impl fmt::Display) -> Self {
        Self::Internal {
            details: details.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::Validation { .. } | Self::SkillUnsupported { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::SkillNotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Unauthorized { message }
            | Self::Validation { message }
            | Self::SkillUnsupported { message }
            | Self::SkillNotImplemented { message } => message,
            Self::Internal { .. } => "Internal server error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { message } => write!(f, "not found: {}", message),
            Self::Conflict { message } => write!(f, "conflict: {}", message),
            Self::Unauthorized { message } => write!(f, "unauthorized: {}", message),
            Self::Validation { message } => write!(f, "validation failed: {}", message),
            Self::SkillUnsupported { message } => write!(f, "unsupported skill: {}", message),
            Self::SkillNotImplemented { message } => {
                write!(f, "skill not implemented: {}", message)
            }
            Self::Internal { details } => write!(f, "internal error: {}", details),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { details } = &self {
            tracing::error!(error = %details, "request failed");
        }
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));
        match self {
            Self::Unauthorized { .. } => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::internal(format!("database error: {}", err))
    }
}

impl From<PersonaError> for ApiError {
    fn from(err: PersonaError) -> Self {
        match err {
            PersonaError::NotFound { .. } => Self::not_found("Character not found"),
        }
    }
}

impl From<SkillError> for ApiError {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::PersonaNotFound { .. } => Self::not_found("Character not found"),
            SkillError::Unsupported { .. } => Self::SkillUnsupported {
                message: err.to_string(),
            },
            SkillError::NotImplemented { .. } => Self::SkillNotImplemented {
                message: err.to_string(),
            },
        }
    }
}
