//! Subscription service - CRUD, payment windows and spending totals

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use homedash_domain::constants::{
    DEFAULT_PAGE_LIMIT, DEFAULT_SORT, STATS_PAGE_SIZE, SUBSCRIPTION_DUE_SOON_DAYS,
    SUBSCRIPTION_DUE_WEEK_DAYS,
};
use homedash_domain::{
    HomedashError, NewSubscription, Result, Subscription, SubscriptionPatch, SubscriptionQuery,
    SubscriptionStats, SubscriptionStatus,
};
use serde_json::json;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::events::ListenerHandle;
use crate::records::ports::{RecordListener, RecordStore};
use crate::records::query::{resolve_sort, QueryOptions};
use crate::records::repository::RecordRepository;

const SORT_ALIASES: &[(&str, &str)] = &[("nextPaymentDate", "nextdate"), ("purchaseDate", "createdAt")];

/// Statuses that stop billing. A missing status counts as active, so
/// filters exclude these instead of matching `active`.
const INACTIVE_STATUSES: [&str; 3] = ["paused", "cancelled", "expired"];

pub struct SubscriptionService {
    records: RecordRepository<Subscription>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { records: RecordRepository::new(store), clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn create(&self, input: NewSubscription) -> Result<Subscription> {
        input.validate()?;
        let subscription = self.records.create(&input).await?;
        info!(id = %subscription.id, "Subscription created");
        Ok(subscription)
    }

    pub async fn list(&self, query: &SubscriptionQuery) -> Result<Vec<Subscription>> {
        let mut options = QueryOptions::new()
            .limit(query.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
            .skip(query.skip.unwrap_or(0));

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            options = options.contains_ignore_case("name", search);
        }
        if let Some(status) = query.status {
            options = options.filter("status", status.as_str());
        }
        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            options = options.filter("category", category);
        }
        options.order = resolve_sort(query.sort.as_deref(), SORT_ALIASES, DEFAULT_SORT);

        self.records.list(&options).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Subscription>> {
        self.records.find_by_id(id).await
    }

    pub async fn update(&self, id: &str, patch: SubscriptionPatch) -> Result<Subscription> {
        patch.validate()?;
        self.records.update(id, &patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.records.delete(id).await?;
        info!(id = %id, "Subscription deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<SubscriptionStats> {
        let subscriptions =
            self.records.list_all(QueryOptions::new().order_by("createdAt"), STATS_PAGE_SIZE).await?;
        Ok(summarize_subscriptions(&subscriptions, self.clock.today()))
    }

    /// Active subscriptions charging within `days` from today, soonest
    /// first.
    pub async fn upcoming_payments(&self, days: i64) -> Result<Vec<Subscription>> {
        if days < 0 {
            return Err(HomedashError::InvalidInput(format!("days must be non-negative, got {days}")));
        }
        let today = self.clock.today();
        let until = today + Duration::days(days);
        let options = QueryOptions::new()
            .filter("nextdate", json!({ "$gte": today.to_string(), "$lte": until.to_string() }))
            .filter("status", json!({ "$nin": INACTIVE_STATUSES }))
            .order_by("nextdate");
        self.records.list_all(options, STATS_PAGE_SIZE).await
    }

    pub async fn set_status(&self, id: &str, status: SubscriptionStatus) -> Result<Subscription> {
        self.update(id, SubscriptionPatch::status(status)).await
    }

    /// Expire active subscriptions whose payment date has passed; returns
    /// how many were updated. Individual failures are logged and skipped.
    pub async fn process_expired(&self) -> Result<usize> {
        let today = self.clock.today();
        let options = QueryOptions::new()
            .filter("nextdate", json!({ "$lt": today.to_string() }))
            .filter("status", json!({ "$nin": INACTIVE_STATUSES }));
        let lapsed = self.records.list_all(options, STATS_PAGE_SIZE).await?;

        let mut updated = 0;
        for subscription in lapsed {
            match self.set_status(&subscription.id, SubscriptionStatus::Expired).await {
                Ok(_) => updated += 1,
                Err(err) => warn!(id = %subscription.id, error = %err, "Failed to expire subscription"),
            }
        }

        info!(updated, "Processed expired subscriptions");
        Ok(updated)
    }

    pub fn subscribe_to_updates(&self, listener: RecordListener) -> ListenerHandle {
        self.records.subscribe(listener)
    }
}

/// Payment buckets and spending as of `today`.
///
/// Spending only counts active subscriptions; a missing billing cycle is
/// treated as monthly.
pub fn summarize_subscriptions(subscriptions: &[Subscription], today: NaiveDate) -> SubscriptionStats {
    let mut stats = SubscriptionStats { total: subscriptions.len(), ..SubscriptionStats::default() };

    for subscription in subscriptions {
        match subscription.effective_status() {
            SubscriptionStatus::Active => {
                stats.active += 1;
                let price = subscription.price.unwrap_or(0.0);
                let cycle = subscription.effective_cycle();
                stats.monthly_spending += price * cycle.monthly_factor();
                stats.yearly_spending += price * cycle.yearly_factor();
            }
            SubscriptionStatus::Expired => stats.expired += 1,
            SubscriptionStatus::Paused | SubscriptionStatus::Cancelled => {}
        }

        match subscription.days_until_payment(today) {
            Some(days) if days < 0 => stats.overdue += 1,
            Some(days) if days <= SUBSCRIPTION_DUE_SOON_DAYS => stats.due_soon += 1,
            Some(days) if days <= SUBSCRIPTION_DUE_WEEK_DAYS => stats.due_this_week += 1,
            _ => {}
        }
    }

    stats
}
