use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::user_service::UserService;
use axum::body::Body;
use axum::http::{HeaderName, Method, Request, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod health;
pub mod middleware;
pub mod schemas;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub user_service: UserService,
    pub health_service: HealthService,
}

/// State of the `/api/auth` routes, which exist only when an identity
/// provider is configured.
#[derive(Clone, Debug)]
pub struct AuthState {
    pub auth_service: AuthService,
}

/// Configures and returns the application router.
pub fn app_router(state: AppState, auth: Option<AuthState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/api/ping", get(health::ping))
        .route("/api/users", post(users::create_user).get(users::list_users))
        .route("/api/users/{id}", get(users::get_user).put(users::update_user).delete(users::delete_user))
        .route("/api/users/email/{email}", get(users::get_user_by_email))
        .with_state(state);

    if let Some(auth) = auth {
        router = router.nest("/api/auth", auth_router(auth));
    }

    router
        .layer(cors_layer())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid))
}

fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/verify-email", get(auth::verify_email))
        .route("/verify-hash", post(auth::verify_hash))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/refresh", post(auth::refresh))
        .route("/me", get(auth::me))
        .with_state(state)
}

/// Any origin is mirrored back so credentialed requests from the desktop
/// client and the verification page both pass.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
}
