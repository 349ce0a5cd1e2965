use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub identity: IdentityProviderConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PASSGO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PASSGO_PORT", default_value_t = 8080)]
    pub port: u16,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for session token signing (HS256)
    #[arg(long, env = "PASSGO_JWT_SECRET")]
    pub jwt_secret: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "PASSGO_DATABASE_URL", default_value = "postgres://localhost/passgo")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long = "database-max-connections", env = "PASSGO_DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing
    #[arg(long = "database-acquire-timeout-secs", env = "PASSGO_DATABASE_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct IdentityProviderConfig {
    /// Base URL of the Supabase project (e.g. https://xyz.supabase.co)
    #[arg(long, env = "PASSGO_SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon/service API key
    #[arg(long, env = "PASSGO_SUPABASE_API_KEY")]
    pub supabase_api_key: Option<String>,

    /// Timeout for requests to the identity provider
    #[arg(long, env = "PASSGO_SUPABASE_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl IdentityProviderConfig {
    /// Returns the URL and API key when both are present and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = self.supabase_url.as_deref().filter(|s| !s.is_empty())?;
        let key = self.supabase_api_key.as_deref().filter(|s| !s.is_empty())?;
        Some((url, key))
    }
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database health probe
    #[arg(long, env = "PASSGO_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "PASSGO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "PASSGO_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let config = Config::try_parse_from(["passgo-backend"]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.identity.request_timeout_secs, 30);
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
    }

    #[test]
    fn test_identity_credentials_require_both_values() {
        let mut identity = IdentityProviderConfig {
            supabase_url: Some("https://example.supabase.co".to_string()),
            supabase_api_key: None,
            request_timeout_secs: 30,
        };
        assert!(identity.credentials().is_none());

        identity.supabase_api_key = Some(String::new());
        assert!(identity.credentials().is_none());

        identity.supabase_api_key = Some("anon-key".to_string());
        assert_eq!(identity.credentials(), Some(("https://example.supabase.co", "anon-key")));
    }
}
