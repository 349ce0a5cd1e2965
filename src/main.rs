#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use passgo_backend::adapters::database::user_repo::UserRepository;
use passgo_backend::adapters::identity::SupabaseClient;
use passgo_backend::api::{AppState, AuthState};
use passgo_backend::config::Config;
use passgo_backend::services::auth_service::AuthService;
use passgo_backend::services::health_service::HealthService;
use passgo_backend::services::identity_provider::IdentityProvider;
use passgo_backend::services::token_service::TokenService;
use passgo_backend::services::user_service::UserService;
use passgo_backend::{adapters, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    passgo_backend::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router) = async {
        let pool = adapters::database::init_pool(&config.database).await?;
        passgo_backend::run_migrations(&pool).await?;

        let tokens = TokenService::new(&config.auth);
        if !tokens.is_configured() {
            tracing::warn!("PASSGO_JWT_SECRET is not set; session tokens cannot be issued or verified");
        }

        let user_repo = UserRepository::new();
        let state = AppState {
            user_service: UserService::new(pool.clone(), user_repo.clone()),
            health_service: HealthService::new(pool.clone(), config.health.clone()),
        };

        let auth = match config.identity.credentials() {
            Some((url, api_key)) => {
                let timeout = Duration::from_secs(config.identity.request_timeout_secs);
                let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseClient::new(url, api_key, timeout)?);
                Some(AuthState { auth_service: AuthService::new(pool, user_repo, tokens, identity) })
            }
            None => {
                tracing::warn!("Supabase is not configured; /api/auth routes are disabled");
                None
            }
        };

        let app_router = passgo_backend::api::app_router(state, auth);

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        tracing::info!(address = %addr, "listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;

        Ok::<(tokio::net::TcpListener, axum::Router), anyhow::Error>((listener, app_router))
    }
    .instrument(boot_span)
    .await?;

    if let Err(e) =
        axum::serve(listener, app_router).with_graceful_shutdown(passgo_backend::shutdown_signal()).await
    {
        tracing::error!(error = %e, "Server error");
    }

    telemetry_guard.shutdown();
    Ok(())
}
