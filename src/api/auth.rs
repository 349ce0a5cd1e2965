use crate::api::AuthState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{
    AuthResponse, EmailRequest, Login, Signup, SignupResponse, TokenResponse, VerificationResponse, VerifyEmailQuery,
    VerifyHash,
};
use crate::api::schemas::health::MessageResponse;
use crate::api::schemas::users::UserResponse;
use crate::domain::auth_session::AuthSession;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};

const SIGNUP_MESSAGE: &str = "User registered successfully. Please check your email to verify your account.";
const VERIFIED_MESSAGE: &str = "Email verified successfully";
const RESET_SENT_MESSAGE: &str = "If your email is registered, you will receive a password reset email";

const VERIFY_EMAIL_PAGE: &str = include_str!("verify_email.html");

pub async fn signup(State(state): State<AuthState>, Json(payload): Json<Signup>) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    let user = state.auth_service.signup(&payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(SignupResponse { message: SIGNUP_MESSAGE.to_string(), user: user.into() })))
}

pub async fn login(State(state): State<AuthState>, Json(payload): Json<Login>) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    let session = state.auth_service.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse { token: session.token, user: session.user.into() }))
}

/// Confirmation link target. With `token` and `email` query parameters the
/// code is checked here; otherwise a page is served that forwards the link
/// fragment to `verify-hash`.
pub async fn verify_email(State(state): State<AuthState>, Query(query): Query<VerifyEmailQuery>) -> Result<Response> {
    if let Some((email, token)) = query.otp() {
        let session = state.auth_service.verify_email_otp(email, token).await?;
        return Ok(Json(map_verification(session)).into_response());
    }
    Ok(Html(VERIFY_EMAIL_PAGE).into_response())
}

pub async fn verify_hash(State(state): State<AuthState>, Json(payload): Json<VerifyHash>) -> Result<impl IntoResponse> {
    if payload.access_token.is_empty() {
        return Err(AppError::BadRequest("access_token is required".to_string()));
    }
    let session = state.auth_service.verify_access_token(&payload.access_token).await?;
    Ok(Json(map_verification(session)))
}

pub async fn resend_verification(
    State(state): State<AuthState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    let message = state.auth_service.resend_verification(&payload.email).await?;
    Ok(Json(MessageResponse::new(message)))
}

pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new(RESET_SENT_MESSAGE)))
}

/// Exchanges the presented token for a fresh one. The `Bearer ` prefix is optional.
pub async fn refresh(State(state): State<AuthState>, headers: HeaderMap) -> Result<impl IntoResponse> {
    let value = headers
        .get(header::AUTHORIZATION)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_string()))?;

    let value = value.to_str().unwrap_or_default();
    let token = value.strip_prefix("Bearer ").unwrap_or(value);

    let token = state.auth_service.refresh(token)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn me(auth_user: AuthUser, State(state): State<AuthState>) -> Result<impl IntoResponse> {
    let user = state.auth_service.current_user(&auth_user.claims.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

fn map_verification(session: AuthSession) -> VerificationResponse {
    VerificationResponse { message: VERIFIED_MESSAGE.to_string(), token: session.token, user: session.user.into() }
}
