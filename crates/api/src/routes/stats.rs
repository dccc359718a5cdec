use axum::extract::State;
use homedash_domain::{FoodStats, SubscriptionStats};
use serde::Serialize;

use super::{ok, ApiResponse, AppState};

/// Dashboard aggregates.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub subscriptions: SubscriptionStats,
    pub foods: FoodStats,
}

/// `GET /api/stats`
pub async fn overview(State(context): State<AppState>) -> ApiResponse<Overview> {
    let subscriptions = context.subscriptions();
    let foods = context.foods();
    let (subscriptions, foods) = tokio::try_join!(subscriptions.stats(), foods.stats())?;
    ok(Overview { subscriptions, foods })
}
