use crate::domain::identity::{OtpKind, ProviderSession, ProviderUser};
use crate::services::identity_provider::{IdentityError, IdentityProvider};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const USER_ALREADY_REGISTERED: &str = "User already registered";
const INVALID_LOGIN_CREDENTIALS: &str = "Invalid login credentials";
const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";

/// Error body returned by the Supabase Auth (GoTrue) API. Older deployments
/// use `error`/`error_description`, newer ones `msg`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<&str> {
        [&self.msg, &self.error_description, &self.error]
            .into_iter()
            .filter_map(Option::as_deref)
            .find(|m| !m.is_empty())
    }
}

/// Client for the Supabase Auth REST API.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl SupabaseClient {
    /// # Errors
    /// Returns `IdentityError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), api_key: api_key.to_string(), http })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url)).header("apikey", &self.api_key)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response, IdentityError> {
        Ok(self.request(Method::POST, path).json(body).send().await?)
    }
}

async fn error_body(response: Response) -> ErrorBody {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    tracing::debug!(status = %status, message = ?body.message(), "Identity provider refused request");
    body
}

/// Signup responses carry the user either under `user` or, when email
/// confirmation is pending, as the top-level object.
fn parse_session(body: Value) -> Result<ProviderSession, IdentityError> {
    if body.get("user").is_some() {
        return Ok(serde_json::from_value(body)?);
    }
    let user: ProviderUser = serde_json::from_value(body)?;
    Ok(ProviderSession { user, ..ProviderSession::default() })
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    #[tracing::instrument(skip(self, email, password), err(level = "warn"))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError> {
        let response = self.post("/auth/v1/signup", &json!({ "email": email, "password": password })).await?;

        if !response.status().is_success() {
            let body = error_body(response).await;
            return Err(match body.message() {
                Some(USER_ALREADY_REGISTERED) => IdentityError::UserAlreadyExists,
                Some(msg) => IdentityError::Rejected(msg.to_string()),
                None => IdentityError::Failed("signup"),
            });
        }

        parse_session(response.json().await?)
    }

    #[tracing::instrument(skip(self, email, password), err(level = "warn"))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError> {
        let response = self
            .post("/auth/v1/token?grant_type=password", &json!({ "email": email, "password": password }))
            .await?;

        if !response.status().is_success() {
            let body = error_body(response).await;
            return Err(match body.message() {
                Some(INVALID_LOGIN_CREDENTIALS) => IdentityError::InvalidCredentials,
                Some(EMAIL_NOT_CONFIRMED) => IdentityError::EmailNotVerified,
                Some(msg) => IdentityError::Rejected(msg.to_string()),
                None => IdentityError::Failed("login"),
            });
        }

        let session = parse_session(response.json().await?)?;
        if !session.user.is_email_confirmed() {
            return Err(IdentityError::EmailNotVerified);
        }
        Ok(session)
    }

    #[tracing::instrument(skip_all, err(level = "warn"))]
    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, IdentityError> {
        let response = self.request(Method::GET, "/auth/v1/user").bearer_auth(access_token).send().await?;

        if !response.status().is_success() {
            error_body(response).await;
            return Err(IdentityError::Failed("get user"));
        }

        Ok(response.json().await?)
    }

    #[tracing::instrument(skip(self, email), err(level = "warn"))]
    async fn resend_verification(&self, email: &str) -> Result<(), IdentityError> {
        let response = self.post("/auth/v1/resend", &json!({ "email": email, "type": OtpKind::Signup })).await?;

        if !response.status().is_success() {
            error_body(response).await;
            return Err(IdentityError::Failed("resend verification email"));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, email, token), err(level = "warn"))]
    async fn verify_otp(&self, email: &str, token: &str, kind: OtpKind) -> Result<ProviderSession, IdentityError> {
        let response =
            self.post("/auth/v1/verify", &json!({ "email": email, "token": token, "type": kind })).await?;

        if !response.status().is_success() {
            error_body(response).await;
            return Err(IdentityError::Failed("verification"));
        }

        parse_session(response.json().await?)
    }

    #[tracing::instrument(skip(self, email), err(level = "warn"))]
    async fn reset_password(&self, email: &str) -> Result<(), IdentityError> {
        let response = self.post("/auth/v1/recover", &json!({ "email": email })).await?;

        if !response.status().is_success() {
            error_body(response).await;
            return Err(IdentityError::Failed("password reset email"));
        }
        Ok(())
    }
}
