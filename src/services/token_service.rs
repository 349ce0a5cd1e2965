use crate::config::AuthConfig;
use crate::domain::auth::{Claims, REFRESH_WINDOW, TOKEN_ISSUER};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    Configuration,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token claims")]
    InvalidTokenClaims,
}

impl TokenError {
    const fn reason(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::InvalidToken => "invalid",
            Self::TokenExpired => "expired",
            Self::InvalidTokenClaims => "claims",
        }
    }
}

#[derive(Clone, Debug)]
struct Metrics {
    issued_total: Counter<u64>,
    refreshed_total: Counter<u64>,
    rejections_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("passgo-backend");
        Self {
            issued_total: meter
                .u64_counter("auth_tokens_issued_total")
                .with_description("Total number of session tokens minted")
                .build(),
            refreshed_total: meter
                .u64_counter("auth_tokens_refreshed_total")
                .with_description("Total number of session tokens exchanged through refresh")
                .build(),
            rejections_total: meter
                .u64_counter("auth_token_rejections_total")
                .with_description("Total number of session tokens rejected, by reason")
                .build(),
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeys(..)")
    }
}

/// Mints, verifies and refreshes HS256 session tokens.
///
/// The signing secret is fixed at construction. A service built without one
/// still constructs, but every operation fails with
/// [`TokenError::Configuration`].
#[derive(Clone, Debug)]
pub struct TokenService {
    keys: Option<Arc<SigningKeys>>,
    metrics: Metrics,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let keys = config.jwt_secret.as_deref().filter(|s| !s.is_empty()).map(|secret| {
            Arc::new(SigningKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            })
        });

        Self { keys, metrics: Metrics::new() }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Issues a token for the given identity, valid for 24 hours from now.
    ///
    /// # Errors
    /// Returns `TokenError::Configuration` if no signing secret is set.
    #[tracing::instrument(level = "debug", skip(self, email), err(level = "warn"))]
    pub fn issue(&self, user_id: &str, email: &str, provider_uid: &str) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, email, provider_uid, OffsetDateTime::now_utc());
        let token = self.sign(&claims)?;
        self.metrics.issued_total.add(1, &[]);
        Ok(token)
    }

    /// Verifies signature, algorithm, issuer and validity window.
    ///
    /// # Errors
    /// `TokenExpired` when only the expiry claim failed, `InvalidTokenClaims`
    /// when the payload does not have the claims shape, `InvalidToken` for
    /// everything else.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_claims(token, false).inspect_err(|e| {
            self.metrics.rejections_total.add(1, &[KeyValue::new("reason", e.reason())]);
        })
    }

    /// Exchanges a token for a fresh one carrying the same identity.
    ///
    /// Expired tokens are still accepted for 7 days after they were issued.
    ///
    /// # Errors
    /// Propagates any non-expiry verification failure. Returns `TokenExpired`
    /// once the token is older than the refresh window.
    #[tracing::instrument(level = "debug", skip_all, err(level = "warn"))]
    pub fn refresh(&self, token: &str) -> Result<String, TokenError> {
        let claims = match self.verify(token) {
            Ok(claims) => claims,
            Err(TokenError::TokenExpired) => {
                let claims = self.decode_claims(token, true).map_err(|_| TokenError::InvalidToken)?;
                if claims.age(OffsetDateTime::now_utc()) > REFRESH_WINDOW {
                    tracing::debug!(user_id = %claims.user_id, "Refresh window elapsed");
                    return Err(TokenError::TokenExpired);
                }
                claims
            }
            Err(e) => return Err(e),
        };

        let token = self.issue(&claims.user_id, &claims.email, &claims.provider_uid)?;
        self.metrics.refreshed_total.add(1, &[]);
        Ok(token)
    }

    /// Decodes a token. With `skip_time_validation` the `nbf` and `exp`
    /// checks are disabled; signature, algorithm and issuer checks still run.
    ///
    /// # Errors
    /// See [`TokenService::verify`].
    pub fn decode_claims(&self, token: &str, skip_time_validation: bool) -> Result<Claims, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::Configuration)?;

        let header = decode_header(token).map_err(|_| TokenError::InvalidToken)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            tracing::warn!(alg = ?header.alg, "Rejected token signed with non-HMAC algorithm");
            return Err(TokenError::InvalidToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = !skip_time_validation;
        validation.validate_nbf = !skip_time_validation;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);

        decode::<Claims>(token, &keys.decoding, &validation).map(|data| data.claims).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::TokenExpired,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => TokenError::InvalidTokenClaims,
            _ => TokenError::InvalidToken,
        })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let keys = self.keys.as_ref().ok_or(TokenError::Configuration)?;
        encode(&Header::new(Algorithm::HS256), claims, &keys.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            TokenError::InvalidToken
        })
    }
}
