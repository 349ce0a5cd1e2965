//! Typed HTTP client the desktop app uses to talk to this backend.

use crate::api::schemas::auth::{AuthResponse, Login, Signup, SignupResponse, TokenResponse};
use crate::api::schemas::users::UserResponse;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Non-success response; `message` is the server's `error` field when present.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("not logged in")]
    NotAuthenticated,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    /// # Errors
    /// Returns `ClientError::Request` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http, token: None })
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Logs in and keeps the returned session token for later calls.
    ///
    /// # Errors
    /// Returns `ClientError::Api` with the server's message on rejection.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = Login { email: email.to_string(), password: password.to_string() };
        let response: AuthResponse = self.send(self.http.post(self.url("/api/auth/login")).json(&body)).await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    /// # Errors
    /// Returns `ClientError::Api` with the server's message on rejection.
    pub async fn signup(&self, email: &str, password: &str) -> Result<SignupResponse, ClientError> {
        let body = Signup { email: email.to_string(), password: password.to_string() };
        self.send(self.http.post(self.url("/api/auth/signup")).json(&body)).await
    }

    /// # Errors
    /// Returns `ClientError::NotAuthenticated` before a successful login.
    pub async fn current_user(&self) -> Result<UserResponse, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        self.send(self.http.get(self.url("/api/auth/me")).bearer_auth(token)).await
    }

    /// Swaps the stored token for a fresh one.
    ///
    /// # Errors
    /// Returns `ClientError::NotAuthenticated` before a successful login.
    pub async fn refresh(&mut self) -> Result<String, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        let response: TokenResponse =
            self.send(self.http.post(self.url("/api/auth/refresh")).bearer_auth(token)).await?;
        self.token = Some(response.token.clone());
        Ok(response.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(api_error(response).await)
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("request failed with status {status}"),
    };
    ClientError::Api { status, message }
}
