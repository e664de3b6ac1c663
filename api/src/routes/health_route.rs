use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Liveness probe.
pub async fn health_route() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "comment-umpire-api",
    })
}
