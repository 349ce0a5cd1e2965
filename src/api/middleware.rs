use crate::api::AuthState;
use crate::domain::auth::Claims;
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// Verified session claims of the caller.
#[derive(Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl FromRequestParts<AuthState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AuthState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_string()))?;

        let token = bearer_token(auth_header.to_str().unwrap_or_default())
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))?;

        let claims = state.auth_service.tokens().verify(token)?;

        tracing::Span::current().record("user_id", tracing::field::display(&claims.user_id));
        Ok(Self { claims })
    }
}

/// Token part of `<scheme> <token>` when the scheme is bearer, in any case.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}
