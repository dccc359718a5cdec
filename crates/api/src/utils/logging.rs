use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use homedash_domain::HomedashError;
use tracing::{info, warn};

/// Log the outcome of a handled request with structured fields.
///
/// Only the method and path are recorded; query strings can carry search
/// terms and bodies can carry credentials.
#[inline]
pub fn log_request_execution(method: &str, path: &str, status: u16, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;

    if status < 500 {
        info!(method, path, status, duration_ms, "request_completed");
    } else {
        warn!(method, path, status, duration_ms, "request_failed");
    }
}

/// Convert a `HomedashError` into a stable label suitable for logging and
/// the `details.type` field of error envelopes.
#[inline]
pub fn error_label(error: &HomedashError) -> &'static str {
    match error {
        HomedashError::Config(_) => "config",
        HomedashError::Network(_) => "network",
        HomedashError::Client { .. } => "client",
        HomedashError::NotInitialized => "not_initialized",
        HomedashError::Auth(_) => "auth",
        HomedashError::NotFound(_) => "not_found",
        HomedashError::InvalidInput(_) => "invalid_input",
        HomedashError::Serialization(_) => "serialization",
        HomedashError::Internal(_) => "internal",
    }
}

/// Middleware timing every request through [`log_request_execution`].
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    log_request_execution(method.as_str(), &path, response.status().as_u16(), started.elapsed());
    response
}
