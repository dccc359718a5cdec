//! Session routes
//!
//! Passwords and session tokens are never logged here; the token is only
//! returned to the caller that logged in.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use homedash_domain::{HomedashError, UserRecord};
use serde::{Deserialize, Serialize};

use super::{json_body, ok, ApiResponse, AppState};

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserRecord,
    pub session_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

/// `POST /api/auth/login` with `{username, password}`.
pub async fn login(
    State(context): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResponse<LoginResponse> {
    let request = json_body(payload)?;
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(HomedashError::InvalidInput("Username and password are required".into()).into());
    }

    let user = context.auth().login(&request.username, &request.password).await?;
    let session_token = user.session_token.clone();
    ok(LoginResponse { user, session_token })
}

/// `POST /api/auth/logout`; always succeeds locally.
pub async fn logout(State(context): State<AppState>) -> ApiResponse<LogoutResponse> {
    context.auth().logout().await;
    ok(LogoutResponse { message: "Logged out successfully" })
}
