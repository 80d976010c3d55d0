//! Health check handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use directory_service_lib::HealthReport;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub services: ServiceStatus,
}

/// Individual backend status.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub storage: &'static str,
    pub cache: &'static str,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        let status = match (report.storage, report.cache) {
            (true, true) => "healthy",
            (true, false) => "degraded",
            (false, _) => "unhealthy",
        };
        Self {
            status,
            services: ServiceStatus {
                storage: up_or_down(report.storage),
                cache: up_or_down(report.cache),
            },
        }
    }
}

fn up_or_down(up: bool) -> &'static str {
    if up {
        "healthy"
    } else {
        "unhealthy"
    }
}

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint. A cache outage only degrades the service.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let report = state.directory.health().await;
    let code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(HealthResponse::from(report))).into_response()
}
