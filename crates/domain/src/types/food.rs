//! Pantry items stored in the `food` collection.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates::optional_date;
use crate::errors::{HomedashError, Result};
use crate::impl_domain_status_conversions;

/// Freshness state of a pantry item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodStatus {
    Fresh,
    ExpiringSoon,
    Expired,
    Consumed,
}

impl_domain_status_conversions!(FoodStatus {
    Fresh => "fresh",
    ExpiringSoon => "expiring_soon",
    Expired => "expired",
    Consumed => "consumed",
});

impl FoodStatus {
    /// Items that still sit in the pantry and can go off.
    pub const fn is_perishable(self) -> bool {
        matches!(self, Self::Fresh | Self::ExpiringSoon)
    }
}

/// A pantry item as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Food {
    pub id: String,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub price: Option<f64>,
    pub shop: Option<String>,
    /// Expiry date.
    #[serde(with = "optional_date")]
    pub todate: Option<NaiveDate>,
    pub photo: Option<String>,
    pub photohash: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub currency: Option<String>,
    pub status: Option<FoodStatus>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Food {
    /// `price × amount`, or nothing when either is missing.
    pub fn value(&self) -> Option<f64> {
        Some(self.price? * self.amount?)
    }

    /// Days from `today` until expiry; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.todate.map(|date| (date - today).num_days())
    }
}

fn default_amount() -> f64 {
    1.0
}

/// Input for creating a pantry item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFood {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub todate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photohash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FoodStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for NewFood {
    fn default() -> Self {
        Self {
            name: None,
            amount: default_amount(),
            price: None,
            shop: None,
            todate: None,
            photo: None,
            photohash: None,
            brand: None,
            category: None,
            unit: None,
            currency: None,
            status: None,
            location: None,
            notes: None,
        }
    }
}

impl NewFood {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        validate_quantities(Some(self.amount), self.price)
    }
}

/// Partial update of a pantry item; only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub todate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photohash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FoodStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FoodPatch {
    pub fn status(status: FoodStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(HomedashError::InvalidInput("name must not be empty".into()));
        }
        validate_quantities(self.amount, self.price)
    }
}

fn validate_quantities(amount: Option<f64>, price: Option<f64>) -> Result<()> {
    if let Some(amount) = amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(HomedashError::InvalidInput(format!("amount must be non-negative, got {amount}")));
        }
    }
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Err(HomedashError::InvalidInput(format!("price must be non-negative, got {price}")));
        }
    }
    Ok(())
}

/// Listing options for pantry items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FoodQuery {
    /// Case-insensitive substring match on `name`.
    pub search: Option<String>,
    /// Field name, `-` prefix for descending. Accepts `expiryDate` and
    /// `purchaseDate` aliases.
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub status: Option<FoodStatus>,
    pub category: Option<String>,
    /// Only items whose expiry date falls between today and today + N days.
    pub expiring_within_days: Option<i64>,
}

/// Aggregates over every pantry item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodStats {
    pub total: usize,
    pub expired: usize,
    /// Expiring within the next 7 days (today included).
    pub expiring_soon: usize,
    /// Expiring in 8 to 30 days.
    pub expiring_later: usize,
    pub total_value: f64,
    pub categories: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_food_defaults_amount_to_one() {
        let food: NewFood = serde_json::from_value(json!({"name": "Milk"})).unwrap();
        assert!((food.amount - 1.0).abs() < f64::EPSILON);
        assert_eq!(serde_json::to_value(&food).unwrap(), json!({"name": "Milk", "amount": 1.0}));
    }

    #[test]
    fn record_accepts_backend_shape() {
        let food: Food = serde_json::from_value(json!({
            "id": "f1",
            "name": "Yoghurt",
            "amount": 2,
            "price": 1.5,
            "todate": "2025-01-05T00:00:00.000Z",
            "status": "expiring_soon",
            "createdAt": "2024-12-30T08:00:00.000Z",
            "somethingElse": true
        }))
        .unwrap();

        assert_eq!(food.todate, NaiveDate::from_ymd_opt(2025, 1, 5));
        assert_eq!(food.status, Some(FoodStatus::ExpiringSoon));
        assert_eq!(food.value(), Some(3.0));
        assert!(food.created_at.is_some());
    }

    #[test]
    fn value_requires_price_and_amount() {
        let food = Food { price: Some(2.0), ..Food::default() };
        assert_eq!(food.value(), None);
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = FoodPatch { amount: Some(0.5), ..FoodPatch::default() };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"amount": 0.5}));
    }

    #[test]
    fn validation_rejects_negative_quantities() {
        assert!(NewFood { amount: -1.0, ..NewFood::default() }.validate().is_err());
        assert!(FoodPatch { price: Some(f64::NAN), ..FoodPatch::default() }.validate().is_err());
        assert!(FoodPatch { name: Some(" ".into()), ..FoodPatch::default() }.validate().is_err());
        assert!(NewFood::named("Rice").validate().is_ok());
    }

    #[test]
    fn status_parses_from_query_string_form() {
        assert_eq!("Expiring_Soon".parse::<FoodStatus>(), Ok(FoodStatus::ExpiringSoon));
        assert!(FoodStatus::Fresh.is_perishable());
        assert!(!FoodStatus::Consumed.is_perishable());
    }
}
