use crate::services::token_service::TokenError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Rejection used by the bearer-token extractor.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        let message = match err {
            TokenError::TokenExpired => "Token has expired",
            TokenError::InvalidToken => "Invalid token",
            TokenError::InvalidTokenClaims => "Invalid token claims",
            TokenError::Configuration => "Authentication failed",
        };
        Self::Unauthorized(message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Unauthorized(msg) => {
                tracing::debug!(message = %msg, "Unauthorized");
                (StatusCode::UNAUTHORIZED, msg)
            }
            Self::Forbidden(msg) => {
                tracing::debug!(message = %msg, "Forbidden");
                (StatusCode::FORBIDDEN, msg)
            }
            Self::NotFound(msg) => {
                tracing::debug!(message = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, msg)
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                (StatusCode::CONFLICT, msg)
            }
            Self::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
