use crate::adapters::database::DbPool;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::auth_session::AuthSession;
use crate::domain::identity::OtpKind;
use crate::domain::user::{NewUser, User};
use crate::error::{AppError, Result};
use crate::services::identity_provider::{IdentityError, IdentityProvider};
use crate::services::token_service::TokenService;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use uuid::Uuid;

pub const RESEND_UNKNOWN_EMAIL_MESSAGE: &str = "If your email is registered, you will receive a verification email";
pub const RESEND_SENT_MESSAGE: &str = "Verification email sent successfully";

#[derive(Clone, Debug)]
struct Metrics {
    login_total: Counter<u64>,
    users_registered_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("passgo-backend");
        Self {
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful logins")
                .build(),
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful signups")
                .build(),
        }
    }
}

/// Account flows that go through the identity provider and end in a local
/// session token.
#[derive(Clone, Debug)]
pub struct AuthService {
    pool: DbPool,
    user_repo: UserRepository,
    tokens: TokenService,
    identity: Arc<dyn IdentityProvider>,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        user_repo: UserRepository,
        tokens: TokenService,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self { pool, user_repo, tokens, identity, metrics: Metrics::new() }
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Registers the account with the provider and records it locally as unverified.
    ///
    /// # Errors
    /// `AppError::Conflict` if the email is already known locally or to the provider.
    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<User> {
        {
            let mut conn = self.pool.acquire().await?;
            if self.user_repo.find_by_email(&mut conn, email).await?.is_some() {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }

        let session = self.identity.sign_up(email, password).await.map_err(|e| match e {
            IdentityError::UserAlreadyExists => {
                AppError::Conflict("User already exists in authentication system".to_string())
            }
            other => {
                tracing::error!(error = %other, "Identity provider signup failed");
                AppError::Internal(format!("Failed to register: {other}"))
            }
        })?;

        let mut conn = self.pool.acquire().await?;
        let user = self
            .user_repo
            .create(
                &mut conn,
                &NewUser { email: email.to_string(), provider_uid: Some(session.user.id), email_verified: false },
            )
            .await
            .map_err(|e| match e {
                AppError::Conflict(msg) => AppError::Conflict(msg),
                other => {
                    tracing::error!(error = %other, "Failed to store new user");
                    AppError::Internal("Failed to create user".to_string())
                }
            })?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        self.metrics.users_registered_total.add(1, &[]);
        Ok(user)
    }

    /// Authenticates against the provider and issues a session token.
    ///
    /// Accounts that exist at the provider but not locally are created on the fly.
    ///
    /// # Errors
    /// `Unauthorized` for bad credentials, `Forbidden` for unverified or disabled accounts.
    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.identity.sign_in(email, password).await.map_err(|e| match e {
            IdentityError::InvalidCredentials => AppError::Unauthorized("Invalid email or password".to_string()),
            IdentityError::EmailNotVerified => {
                AppError::Forbidden("Please verify your email before logging in".to_string())
            }
            other => {
                tracing::warn!(error = %other, "Identity provider login failed");
                AppError::Unauthorized("Authentication failed".to_string())
            }
        })?;

        let mut conn = self.pool.acquire().await?;
        let existing = self
            .user_repo
            .find_by_email(&mut conn, email)
            .await
            .map_err(internal("Failed to retrieve user"))?;

        let mut user = if let Some(user) = existing {
            user
        } else {
            tracing::info!("Syncing provider account into local store");
            let new_user = NewUser {
                email: session.user.email.clone(),
                provider_uid: Some(session.user.id.clone()),
                email_verified: true,
            };
            self.user_repo
                .create(&mut conn, &new_user)
                .await
                .map_err(internal("Failed to sync user"))?
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !user.email_verified && session.user.is_email_confirmed() {
            match self.user_repo.set_email_verified(&mut conn, user.id, true).await {
                Ok(_) => user.email_verified = true,
                Err(e) => tracing::warn!(error = %e, "Failed to record email verification"),
            }
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        let provider_uid = user.provider_uid.clone().unwrap_or_else(|| session.user.id.clone());
        let token = self.issue_token(&user, &provider_uid)?;

        self.metrics.login_total.add(1, &[]);
        Ok(AuthSession { token, user })
    }

    /// Confirms the signup code the provider emailed and issues a session token.
    ///
    /// # Errors
    /// `BadRequest` if the provider rejects the code.
    #[tracing::instrument(skip(self, email, token), err(level = "warn"))]
    pub async fn verify_email_otp(&self, email: &str, token: &str) -> Result<AuthSession> {
        let session = self.identity.verify_otp(email, token, OtpKind::Signup).await.map_err(|e| {
            tracing::debug!(error = %e, "OTP verification refused");
            AppError::BadRequest("Invalid or expired verification token".to_string())
        })?;

        self.finalize_verification(email, &session.user.id).await
    }

    /// Completes verification from the provider access token delivered in the
    /// confirmation link fragment.
    ///
    /// # Errors
    /// `Unauthorized` if the provider does not accept the access token.
    #[tracing::instrument(skip_all, err(level = "warn"))]
    pub async fn verify_access_token(&self, access_token: &str) -> Result<AuthSession> {
        let provider_user = self.identity.get_user(access_token).await.map_err(|e| {
            tracing::debug!(error = %e, "Provider access token refused");
            AppError::Unauthorized("Invalid access token".to_string())
        })?;

        self.finalize_verification(&provider_user.email, &provider_user.id).await
    }

    async fn finalize_verification(&self, email: &str, provider_uid: &str) -> Result<AuthSession> {
        let mut conn = self.pool.acquire().await?;
        let mut user = self
            .user_repo
            .find_by_email(&mut conn, email)
            .await
            .map_err(internal("Failed to retrieve user"))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.user_repo
            .set_email_verified(&mut conn, user.id, true)
            .await
            .map_err(internal("Failed to update verification status"))?;
        user.email_verified = true;

        let token = self.issue_token(&user, provider_uid)?;
        Ok(AuthSession { token, user })
    }

    /// Asks the provider to send the confirmation email again.
    ///
    /// Unknown addresses get the same success message as known ones.
    ///
    /// # Errors
    /// `BadRequest` if the email is already verified.
    #[tracing::instrument(skip(self, email), err(level = "warn"))]
    pub async fn resend_verification(&self, email: &str) -> Result<&'static str> {
        let user = {
            let mut conn = self.pool.acquire().await?;
            self.user_repo
                .find_by_email(&mut conn, email)
                .await
                .map_err(internal("Failed to process request"))?
        };

        let Some(user) = user else {
            return Ok(RESEND_UNKNOWN_EMAIL_MESSAGE);
        };

        if user.email_verified {
            return Err(AppError::BadRequest("Email is already verified".to_string()));
        }

        self.identity.resend_verification(email).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to resend verification email");
            AppError::Internal("Failed to send verification email".to_string())
        })?;

        Ok(RESEND_SENT_MESSAGE)
    }

    /// Sends a password reset email. Does not reveal whether the account exists.
    ///
    /// # Errors
    /// `Internal` if the provider refuses.
    #[tracing::instrument(skip(self, email), err(level = "warn"))]
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        self.identity.reset_password(email).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to send password reset email");
            AppError::Internal("Failed to send password reset email".to_string())
        })
    }

    /// # Errors
    /// `Unauthorized` for any token that cannot be refreshed.
    pub fn refresh(&self, token: &str) -> Result<String> {
        self.tokens.refresh(token).map_err(|e| {
            tracing::debug!(error = %e, "Token refresh refused");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })
    }

    /// # Errors
    /// `NotFound` if the account behind a valid token no longer exists.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn current_user(&self, user_id: &str) -> Result<User> {
        let id = Uuid::parse_str(user_id).map_err(|_| AppError::NotFound("User not found".to_string()))?;

        let mut conn = self.pool.acquire().await?;
        self.user_repo
            .find_by_id(&mut conn, id)
            .await
            .map_err(internal("Failed to retrieve user"))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    fn issue_token(&self, user: &User, provider_uid: &str) -> Result<String> {
        self.tokens.issue(&user.id.to_string(), &user.email, provider_uid).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue session token");
            AppError::Internal("Failed to generate token".to_string())
        })
    }
}

/// Logs the underlying failure and replaces it with a generic 500.
fn internal(message: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| {
        tracing::error!(error = %err, "{message}");
        AppError::Internal(message.to_string())
    }
}
