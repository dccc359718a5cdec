//! `/api/foods` routes

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use homedash_domain::{Food, FoodPatch, FoodQuery, HomedashError, NewFood};
use serde_json::{json, Value};

use super::{created, json_body, ok, query_params, ApiResponse, AppState, WindowQuery};

/// `GET /api/foods?search=&sort=&limit=&skip=&status=&category=&expiringWithinDays=`
pub async fn list(
    State(context): State<AppState>,
    query: Result<Query<FoodQuery>, QueryRejection>,
) -> ApiResponse<Vec<Food>> {
    let query = query_params(query)?;
    ok(context.foods().list(&query).await?)
}

/// `POST /api/foods` → 201
pub async fn create(
    State(context): State<AppState>,
    payload: Result<Json<NewFood>, JsonRejection>,
) -> ApiResponse<Food> {
    let input = json_body(payload)?;
    created(context.foods().create(input).await?)
}

pub async fn show(State(context): State<AppState>, Path(id): Path<String>) -> ApiResponse<Food> {
    match context.foods().get(&id).await? {
        Some(food) => ok(food),
        None => Err(HomedashError::NotFound(format!("food {id}")).into()),
    }
}

pub async fn update(
    State(context): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FoodPatch>, JsonRejection>,
) -> ApiResponse<Food> {
    let patch = json_body(payload)?;
    ok(context.foods().update(&id, patch).await?)
}

pub async fn remove(State(context): State<AppState>, Path(id): Path<String>) -> ApiResponse<Value> {
    context.foods().delete(&id).await?;
    ok(json!({ "id": id }))
}

/// `GET /api/foods/expiring?days=N`, default 7 days.
pub async fn expiring(
    State(context): State<AppState>,
    window: Result<Query<WindowQuery>, QueryRejection>,
) -> ApiResponse<Vec<Food>> {
    let days = query_params(window)?.days_or_default();
    ok(context.foods().expiring(days).await?)
}
