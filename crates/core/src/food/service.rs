//! Food service - CRUD and expiry tracking for pantry items

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use homedash_domain::constants::{
    DEFAULT_PAGE_LIMIT, DEFAULT_SORT, FOOD_EXPIRING_LATER_DAYS, FOOD_EXPIRING_SOON_DAYS,
    STATS_PAGE_SIZE, UNCATEGORIZED,
};
use homedash_domain::{
    Food, FoodPatch, FoodQuery, FoodStats, FoodStatus, HomedashError, NewFood, Result,
};
use serde_json::json;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::events::ListenerHandle;
use crate::records::ports::{RecordListener, RecordStore};
use crate::records::query::{resolve_sort, QueryOptions};
use crate::records::repository::RecordRepository;

const SORT_ALIASES: &[(&str, &str)] = &[("expiryDate", "todate"), ("purchaseDate", "createdAt")];

/// Statuses that can no longer expire.
const SETTLED_STATUSES: [&str; 2] = ["consumed", "expired"];

/// Food service
pub struct FoodService {
    records: RecordRepository<Food>,
    clock: Arc<dyn Clock>,
}

impl FoodService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { records: RecordRepository::new(store), clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn create(&self, input: NewFood) -> Result<Food> {
        input.validate()?;
        let food = self.records.create(&input).await?;
        info!(id = %food.id, "Food item created");
        Ok(food)
    }

    /// List with search, filters, sort and paging. Defaults: 50 items from
    /// offset 0, newest first.
    pub async fn list(&self, query: &FoodQuery) -> Result<Vec<Food>> {
        let options = self.list_options(query)?;
        self.records.list(&options).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Food>> {
        self.records.find_by_id(id).await
    }

    pub async fn update(&self, id: &str, patch: FoodPatch) -> Result<Food> {
        patch.validate()?;
        self.records.update(id, &patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.records.delete(id).await?;
        info!(id = %id, "Food item deleted");
        Ok(())
    }

    /// Aggregates over every item, relative to today.
    pub async fn stats(&self) -> Result<FoodStats> {
        let foods = self.records.list_all(QueryOptions::new().order_by("createdAt"), STATS_PAGE_SIZE).await?;
        Ok(summarize_foods(&foods, self.clock.today()))
    }

    /// Items still in the pantry whose expiry date falls within `days`
    /// from today, soonest first.
    pub async fn expiring(&self, days: i64) -> Result<Vec<Food>> {
        if days < 0 {
            return Err(HomedashError::InvalidInput(format!("days must be non-negative, got {days}")));
        }
        let today = self.clock.today();
        let options = QueryOptions::new()
            .filter("todate", date_range(today, today + Duration::days(days)))
            .filter("status", json!({ "$nin": SETTLED_STATUSES }))
            .order_by("todate");
        self.records.list_all(options, STATS_PAGE_SIZE).await
    }

    /// Items past their expiry date that are not yet settled, most
    /// recently expired first.
    pub async fn expired(&self) -> Result<Vec<Food>> {
        let options = overdue_options(self.clock.today()).order_by("-todate");
        self.records.list_all(options, STATS_PAGE_SIZE).await
    }

    /// Consume `quantity` of an item, or all of it when `quantity` is
    /// absent or covers the remaining amount.
    pub async fn mark_consumed(&self, id: &str, quantity: Option<f64>) -> Result<Food> {
        if let Some(quantity) = quantity {
            if !quantity.is_finite() || quantity <= 0.0 {
                return Err(HomedashError::InvalidInput(format!("quantity must be positive, got {quantity}")));
            }
        }
        let food = self.get(id).await?.ok_or_else(|| HomedashError::NotFound(format!("food {id}")))?;
        let remaining = food.amount.unwrap_or(1.0);

        let patch = match quantity {
            Some(quantity) if quantity > 0.0 && quantity < remaining => {
                FoodPatch { amount: Some(remaining - quantity), ..FoodPatch::default() }
            }
            _ => FoodPatch { amount: Some(0.0), ..FoodPatch::status(FoodStatus::Consumed) },
        };
        self.update(id, patch).await
    }

    /// Mark items past their expiry date as expired; returns how many were
    /// updated. Individual failures are logged and skipped.
    pub async fn process_expired(&self) -> Result<usize> {
        let overdue = self.records.list_all(overdue_options(self.clock.today()), STATS_PAGE_SIZE).await?;

        let mut updated = 0;
        for food in overdue {
            match self.records.update(&food.id, &FoodPatch::status(FoodStatus::Expired)).await {
                Ok(_) => updated += 1,
                Err(err) => warn!(id = %food.id, error = %err, "Failed to mark food item expired"),
            }
        }

        info!(updated, "Processed expired food items");
        Ok(updated)
    }

    /// Distinct non-empty categories, sorted.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let foods = self.records.list_all(QueryOptions::new().select("category"), STATS_PAGE_SIZE).await?;
        let categories: BTreeSet<String> = foods
            .into_iter()
            .filter_map(|food| food.category)
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    pub fn subscribe_to_updates(&self, listener: RecordListener) -> ListenerHandle {
        self.records.subscribe(listener)
    }

    fn list_options(&self, query: &FoodQuery) -> Result<QueryOptions> {
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
        if let Some(days) = query.expiring_within_days {
            if days < 0 {
                return Err(HomedashError::InvalidInput(format!(
                    "expiringWithinDays must be non-negative, got {days}"
                )));
            }
            let today = self.clock.today();
            options = options.filter("todate", date_range(today, today + Duration::days(days)));
        }

        options.order = resolve_sort(query.sort.as_deref(), SORT_ALIASES, DEFAULT_SORT);
        Ok(options)
    }
}

fn overdue_options(today: NaiveDate) -> QueryOptions {
    QueryOptions::new()
        .filter("todate", json!({ "$lt": today.to_string() }))
        .filter("status", json!({ "$nin": SETTLED_STATUSES }))
}

fn date_range(from: NaiveDate, to: NaiveDate) -> serde_json::Value {
    json!({ "$gte": from.to_string(), "$lte": to.to_string() })
}

/// Expiry buckets, value and category counts as of `today`.
pub fn summarize_foods(foods: &[Food], today: NaiveDate) -> FoodStats {
    let mut stats = FoodStats { total: foods.len(), ..FoodStats::default() };

    for food in foods {
        match food.days_until_expiry(today) {
            Some(days) if days < 0 => stats.expired += 1,
            Some(days) if days <= FOOD_EXPIRING_SOON_DAYS => stats.expiring_soon += 1,
            Some(days) if days <= FOOD_EXPIRING_LATER_DAYS => stats.expiring_later += 1,
            _ => {}
        }

        if let Some(value) = food.value() {
            stats.total_value += value;
        }

        let category = food
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(UNCATEGORIZED);
        *stats.categories.entry(category.to_string()).or_default() += 1;
    }

    stats
}
