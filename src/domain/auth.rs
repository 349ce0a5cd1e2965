use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Value of the `iss` claim on every session token this service mints.
pub const TOKEN_ISSUER: &str = "passgo-backend";

/// How long a freshly issued session token is accepted by `verify`.
pub const TOKEN_TTL: Duration = Duration::hours(24);

/// How long after issuance an expired token may still be exchanged for a new one.
pub const REFRESH_WINDOW: Duration = Duration::days(7);

/// Claims carried by a session token.
///
/// Timestamps are unix seconds. Field names on the wire match the tokens the
/// service has always issued, so `provider_uid` serializes as `supabase_uid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    #[serde(rename = "supabase_uid")]
    pub provider_uid: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn new(user_id: &str, email: &str, provider_uid: &str, issued_at: OffsetDateTime) -> Self {
        let iat = issued_at.unix_timestamp();
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            provider_uid: provider_uid.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat,
            nbf: iat,
            exp: (issued_at + TOKEN_TTL).unix_timestamp(),
        }
    }

    /// Time elapsed since the token was issued, measured against `now`.
    #[must_use]
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        Duration::seconds(now.unix_timestamp() - self.iat)
    }
}
