//! HTTP routes
//!
//! Every response body is an [`ApiResult`] envelope. Errors become
//! `{success: false, error: {code, message, details}}` with the status chosen
//! by [`ApiError::status_code`].

pub mod auth;
pub mod foods;
pub mod health;
pub mod stats;
pub mod subscriptions;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use homedash_domain::constants::DEFAULT_EXPIRING_WINDOW_DAYS;
use homedash_domain::{ApiFailure, ApiResult, HomedashError};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_requests};

/// Shared handler state.
pub type AppState = Arc<AppContext>;

/// Build the application router.
pub fn build_router(context: AppState) -> Router {
    Router::new()
        .route("/api/foods", get(foods::list).post(foods::create))
        .route("/api/foods/expiring", get(foods::expiring))
        .route("/api/foods/{id}", get(foods::show).put(foods::update).delete(foods::remove))
        .route("/api/subscriptions", get(subscriptions::list).post(subscriptions::create))
        .route("/api/subscriptions/upcoming", get(subscriptions::upcoming))
        .route(
            "/api/subscriptions/{id}",
            get(subscriptions::show).put(subscriptions::update).delete(subscriptions::remove),
        )
        .route("/api/stats", get(stats::overview))
        .route("/api/health", get(health::check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(context)
}

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub HomedashError);

impl ApiError {
    /// Invalid input 400, not found 404, auth 401, backend 4xx passed
    /// through, everything else 500.
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            HomedashError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            HomedashError::NotFound(_) => StatusCode::NOT_FOUND,
            HomedashError::Auth(_) => StatusCode::UNAUTHORIZED,
            HomedashError::Client { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(StatusCode::is_client_error)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HomedashError> for ApiError {
    fn from(err: HomedashError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let label = error_label(&self.0);

        if status.is_server_error() {
            tracing::error!(error_type = label, error = %self.0, "request failed");
        } else {
            tracing::debug!(error_type = label, error = %self.0, "request rejected");
        }

        let failure = ApiFailure::new(status.as_u16(), self.0.to_string()).with_detail("type", label);
        (status, Json(ApiResult::<()>::Failure(failure))).into_response()
    }
}

/// Handler result.
pub type ApiResponse<T> = Result<(StatusCode, Json<ApiResult<T>>), ApiError>;

/// 200 with a success envelope.
pub fn ok<T: Serialize>(data: T) -> ApiResponse<T> {
    Ok((StatusCode::OK, Json(ApiResult::Success(data))))
}

/// 201 with a success envelope.
pub fn created<T: Serialize>(data: T) -> ApiResponse<T> {
    Ok((StatusCode::CREATED, Json(ApiResult::Success(data))))
}

/// `?days=` window for the expiring and upcoming routes.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

impl WindowQuery {
    pub fn days_or_default(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_EXPIRING_WINDOW_DAYS)
    }
}

/// Unwrap a JSON body, reporting a malformed one as invalid input.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| HomedashError::InvalidInput(rejection.body_text()).into())
}

/// Unwrap query parameters, reporting malformed ones as invalid input.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| HomedashError::InvalidInput(rejection.body_text()).into())
}

async fn not_found() -> ApiError {
    ApiError(HomedashError::NotFound("no such route".into()))
}
