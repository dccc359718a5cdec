use axum::extract::{Json, State};
use axum::http::StatusCode;
use serde::Serialize;

use super::AppState;
use crate::utils::health::HealthStatus;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: HealthStatus,
}

/// `GET /api/health`: 200 when every check passes, 503 otherwise.
///
/// # Example Response
/// ```json
/// {
///   "success": true,
///   "healthy": true,
///   "checks": { "backendClient": true, "connectivity": true },
///   "errors": [],
///   "timestamp": "2025-03-01T09:30:00.000Z"
/// }
/// ```
pub async fn check(State(context): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let status = context.health_check().await;
    let code = if status.healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(HealthResponse { success: true, status }))
}
