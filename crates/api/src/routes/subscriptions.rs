//! `/api/subscriptions` routes

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use homedash_domain::{
    HomedashError, NewSubscription, Subscription, SubscriptionPatch, SubscriptionQuery,
};
use serde_json::{json, Value};

use super::{created, json_body, ok, query_params, ApiResponse, AppState, WindowQuery};

pub async fn list(
    State(context): State<AppState>,
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> ApiResponse<Vec<Subscription>> {
    let query = query_params(query)?;
    ok(context.subscriptions().list(&query).await?)
}

pub async fn create(
    State(context): State<AppState>,
    payload: Result<Json<NewSubscription>, JsonRejection>,
) -> ApiResponse<Subscription> {
    let input = json_body(payload)?;
    created(context.subscriptions().create(input).await?)
}

pub async fn show(
    State(context): State<AppState>,
    Path(id): Path<String>,
) -> ApiResponse<Subscription> {
    match context.subscriptions().get(&id).await? {
        Some(subscription) => ok(subscription),
        None => Err(HomedashError::NotFound(format!("subscription {id}")).into()),
    }
}

pub async fn update(
    State(context): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionPatch>, JsonRejection>,
) -> ApiResponse<Subscription> {
    let patch = json_body(payload)?;
    ok(context.subscriptions().update(&id, patch).await?)
}

pub async fn remove(State(context): State<AppState>, Path(id): Path<String>) -> ApiResponse<Value> {
    context.subscriptions().delete(&id).await?;
    ok(json!({ "id": id }))
}

/// `GET /api/subscriptions/upcoming?days=N`, default 7 days.
pub async fn upcoming(
    State(context): State<AppState>,
    window: Result<Query<WindowQuery>, QueryRejection>,
) -> ApiResponse<Vec<Subscription>> {
    let days = query_params(window)?.days_or_default();
    ok(context.subscriptions().upcoming_payments(days).await?)
}
