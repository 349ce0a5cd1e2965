use crate::domain::identity::{OtpKind, ProviderSession, ProviderUser};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email not verified")]
    EmailNotVerified,
    /// The provider refused the request and said why.
    #[error("{0}")]
    Rejected(String),
    /// The provider refused the request without a usable explanation.
    #[error("{0} failed")]
    Failed(&'static str),
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected identity provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remote service of record for credentials and email confirmation.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Registers a new account; the provider sends the confirmation email.
    ///
    /// # Errors
    /// Returns `IdentityError::UserAlreadyExists` if the email is registered.
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError>;

    /// Password grant.
    ///
    /// # Errors
    /// Returns `IdentityError::InvalidCredentials` or
    /// `IdentityError::EmailNotVerified` for the corresponding refusals.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError>;

    /// Resolves a provider access token to its user.
    ///
    /// # Errors
    /// Returns an error if the token is not accepted by the provider.
    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, IdentityError>;

    /// # Errors
    /// Returns an error if the provider refuses to send the email.
    async fn resend_verification(&self, email: &str) -> Result<(), IdentityError>;

    /// Confirms a one-time code sent by email.
    ///
    /// # Errors
    /// Returns an error if the code is wrong or expired.
    async fn verify_otp(&self, email: &str, token: &str, kind: OtpKind) -> Result<ProviderSession, IdentityError>;

    /// # Errors
    /// Returns an error if the provider refuses to send the email.
    async fn reset_password(&self, email: &str) -> Result<(), IdentityError>;
}
