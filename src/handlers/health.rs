use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db;
use crate::AppState;

/// Creates the router for health endpoints
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/live", get(liveness))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub database: ComponentStatus,
    pub timestamp: String,
}

/// Readiness: the service and its database
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> Response {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => ComponentStatus::Up,
        Err(_) => ComponentStatus::Down,
    };

    let (status, code) = match database {
        ComponentStatus::Up => (ComponentStatus::Up, StatusCode::OK),
        ComponentStatus::Down => (ComponentStatus::Down, StatusCode::SERVICE_UNAVAILABLE),
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (code, Json(body)).into_response()
}

/// Liveness: the process answers
#[utoipa::path(
    get,
    path = "/api/v1/health/live",
    responses((status = 200, description = "Process is up")),
    tag = "Health"
)]
pub async fn liveness() -> &'static str {
    "ok"
}
