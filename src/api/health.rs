use crate::api::AppState;
use crate::api::schemas::health::{
    DATABASE_CONNECTED, DATABASE_DISCONNECTED, HealthResponse, MessageResponse, STATUS_DEGRADED, STATUS_HEALTHY,
};
use axum::{Json, extract::State, response::IntoResponse};

/// Always 200; a failed database probe only degrades the reported status.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database) = match state.health_service.check_db().await {
        Ok(()) => (STATUS_HEALTHY, DATABASE_CONNECTED),
        Err(e) => {
            tracing::warn!(error = %e, component = "database", "Health check failed");
            (STATUS_DEGRADED, DATABASE_DISCONNECTED)
        }
    };

    Json(HealthResponse { status: status.to_string(), database: database.to_string() })
}

pub async fn ping() -> impl IntoResponse {
    Json(MessageResponse::new("pong"))
}
