//! Health check endpoint for monitoring and readiness probes

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    #[schema(example = "InCrime API is running")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Liveness probe. Does not touch the database.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "InCrime API is running".to_string(),
        timestamp: Utc::now(),
    })
}
