//! Subscription service behaviour against an in-memory record store.

mod support;

use std::sync::Arc;

use homedash_core::SubscriptionService;
use homedash_domain::{
    BillingCycle, HomedashError, NewSubscription, SubscriptionPatch, SubscriptionQuery,
    SubscriptionStatus,
};
use serde_json::json;
use support::store::InMemoryRecordStore;
use support::{day, fixed_clock};

fn service() -> (Arc<InMemoryRecordStore>, SubscriptionService) {
    let store = Arc::new(InMemoryRecordStore::new());
    let service = SubscriptionService::new(store.clone()).with_clock(fixed_clock(2025, 2, 26));
    (store, service)
}

#[tokio::test]
async fn create_defaults_price_and_returns_backend_fields() {
    let (store, subscriptions) = service();
    let input: NewSubscription = serde_json::from_value(json!({"name": "Video", "nextdate": "2025-03-01"})).unwrap();

    let created = subscriptions.create(input).await.unwrap();

    assert_eq!(created.price, Some(0.0));
    assert_eq!(created.nextdate, Some(day(2025, 3, 1)));
    assert!(created.created_at.is_some());
    assert_eq!(store.stored("subscription", &created.id).unwrap()["name"], "Video");
}

#[tokio::test]
async fn create_requires_a_name() {
    let (store, subscriptions) = service();
    let result = subscriptions.create(NewSubscription::new(" ", 5.0)).await;
    assert!(matches!(result, Err(HomedashError::InvalidInput(_))));
    assert_eq!(store.count("subscription"), 0);
}

#[tokio::test]
async fn list_resolves_payment_alias_and_filters() {
    let (store, subscriptions) = service();
    store.seed("subscription", json!({"name": "b", "nextdate": "2025-03-09", "status": "active"}));
    store.seed("subscription", json!({"name": "a", "nextdate": "2025-03-01", "status": "paused"}));

    let query = SubscriptionQuery { sort: Some("-nextPaymentDate".into()), ..SubscriptionQuery::default() };
    let listed = subscriptions.list(&query).await.unwrap();
    assert_eq!(store.last_query().order, vec!["-nextdate"]);
    assert_eq!(listed[0].name.as_deref(), Some("b"));

    let paused = SubscriptionQuery { status: Some(SubscriptionStatus::Paused), ..SubscriptionQuery::default() };
    let listed = subscriptions.list(&paused).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name.as_deref(), Some("a"));
}

#[tokio::test]
async fn get_returns_none_for_unknown_id() {
    let (store, subscriptions) = service();
    store.seed("subscription", json!({"name": "x"}));

    assert_eq!(subscriptions.get("unknown").await.unwrap(), None);
    let query = store.last_query();
    assert_eq!(query.filter["objectId"], "unknown");
    assert_eq!(query.limit, Some(1));
}

#[tokio::test]
async fn update_returns_applied_fields_only() {
    let (store, subscriptions) = service();
    let id = store.seed("subscription", json!({"name": "Music", "price": 9.99}));

    let patch = SubscriptionPatch { billing_cycle: Some(BillingCycle::Yearly), ..SubscriptionPatch::default() };
    let updated = subscriptions.update(&id, patch).await.unwrap();

    assert_eq!(updated.billing_cycle, Some(BillingCycle::Yearly));
    assert_eq!(updated.name, None);
    assert_eq!(store.stored("subscription", &id).unwrap()["name"], "Music");
    assert_eq!(store.stored("subscription", &id).unwrap()["billingCycle"], "yearly");
}

#[tokio::test]
async fn stats_cover_buckets_and_spending() {
    let (store, subscriptions) = service();
    store.seed("subscription", json!({"price": 10, "nextdate": "2025-02-25"}));
    store.seed("subscription", json!({"price": 120, "billingCycle": "yearly", "nextdate": "2025-02-28"}));
    store.seed("subscription", json!({"price": 3, "billingCycle": "weekly", "nextdate": "2025-03-04"}));
    store.seed("subscription", json!({"price": 50, "status": "expired"}));
    store.seed("subscription", json!({"price": 50, "status": "cancelled", "nextdate": "2025-06-01"}));

    let stats = subscriptions.stats().await.unwrap();

    assert_eq!(stats.total, 5);
    assert_eq!(stats.active, 3);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.due_soon, 1);
    assert_eq!(stats.due_this_week, 1);
    assert!((stats.monthly_spending - (10.0 + 10.0 + 3.0 * 4.33)).abs() < 1e-9);
    assert!((stats.yearly_spending - (120.0 + 120.0 + 156.0)).abs() < 1e-9);
}

#[tokio::test]
async fn upcoming_payments_skip_inactive() {
    let (store, subscriptions) = service();
    store.seed("subscription", json!({"name": "due", "nextdate": "2025-03-01"}));
    store.seed("subscription", json!({"name": "paused", "nextdate": "2025-03-01", "status": "paused"}));
    store.seed("subscription", json!({"name": "first", "nextdate": "2025-02-26", "status": "active"}));
    store.seed("subscription", json!({"name": "far", "nextdate": "2025-04-01"}));

    let names: Vec<_> =
        subscriptions.upcoming_payments(7).await.unwrap().into_iter().filter_map(|s| s.name).collect();
    assert_eq!(names, vec!["first", "due"]);

    assert!(matches!(subscriptions.upcoming_payments(-2).await, Err(HomedashError::InvalidInput(_))));
}

#[tokio::test]
async fn set_status_and_process_expired() {
    let (store, subscriptions) = service();
    let lapsed = store.seed("subscription", json!({"name": "lapsed", "nextdate": "2025-02-01"}));
    let paused = store.seed("subscription", json!({"name": "paused", "nextdate": "2025-02-01", "status": "paused"}));
    let current = store.seed("subscription", json!({"name": "current", "nextdate": "2025-03-01"}));

    assert_eq!(subscriptions.process_expired().await.unwrap(), 1);
    assert_eq!(store.stored("subscription", &lapsed).unwrap()["status"], "expired");
    assert_eq!(store.stored("subscription", &paused).unwrap()["status"], "paused");

    let cancelled = subscriptions.set_status(&current, SubscriptionStatus::Cancelled).await.unwrap();
    assert_eq!(cancelled.status, Some(SubscriptionStatus::Cancelled));
}
