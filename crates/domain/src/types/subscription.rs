//! Recurring payments stored in the `subscription` collection.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates::optional_date;
use crate::errors::{HomedashError, Result};
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
    Expired,
}

impl_domain_status_conversions!(SubscriptionStatus {
    Active => "active",
    Paused => "paused",
    Cancelled => "cancelled",
    Expired => "expired",
});

/// How often a subscription charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Weekly,
    Daily,
}

impl_domain_status_conversions!(BillingCycle {
    Monthly => "monthly",
    Yearly => "yearly",
    Weekly => "weekly",
    Daily => "daily",
});

impl BillingCycle {
    /// Multiplier turning one charge into a monthly amount.
    pub fn monthly_factor(self) -> f64 {
        match self {
            Self::Monthly => 1.0,
            Self::Yearly => 1.0 / 12.0,
            Self::Weekly => 4.33,
            Self::Daily => 30.0,
        }
    }

    /// Multiplier turning one charge into a yearly amount.
    pub fn yearly_factor(self) -> f64 {
        match self {
            Self::Monthly => 12.0,
            Self::Yearly => 1.0,
            Self::Weekly => 52.0,
            Self::Daily => 365.0,
        }
    }
}

/// A subscription as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    /// Next payment date.
    #[serde(with = "optional_date")]
    pub nextdate: Option<NaiveDate>,
    pub site: Option<String>,
    pub account: Option<String>,
    pub note: Option<String>,
    pub category: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub reminder_days: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Missing status counts as active.
    pub fn effective_status(&self) -> SubscriptionStatus {
        self.status.unwrap_or(SubscriptionStatus::Active)
    }

    /// Missing billing cycle counts as monthly.
    pub fn effective_cycle(&self) -> BillingCycle {
        self.billing_cycle.unwrap_or(BillingCycle::Monthly)
    }

    pub fn days_until_payment(&self, today: NaiveDate) -> Option<i64> {
        self.nextdate.map(|date| (date - today).num_days())
    }
}

/// Input for creating a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub nextdate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_days: Option<u32>,
}

impl NewSubscription {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self { name: name.into(), price, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HomedashError::InvalidInput("name is required".into()));
        }
        validate_price(Some(self.price))
    }
}

/// Partial update of a subscription; only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
    pub nextdate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_days: Option<u32>,
}

impl SubscriptionPatch {
    pub fn status(status: SubscriptionStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(HomedashError::InvalidInput("name must not be empty".into()));
        }
        validate_price(self.price)
    }
}

fn validate_price(price: Option<f64>) -> Result<()> {
    match price {
        Some(price) if !price.is_finite() || price < 0.0 => {
            Err(HomedashError::InvalidInput(format!("price must be non-negative, got {price}")))
        }
        _ => Ok(()),
    }
}

/// Listing options for subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubscriptionQuery {
    pub search: Option<String>,
    /// Field name, `-` prefix for descending. Accepts the `nextPaymentDate`
    /// alias.
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub status: Option<SubscriptionStatus>,
    pub category: Option<String>,
}

/// Aggregates over every subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    /// Next payment date already passed.
    pub overdue: usize,
    /// Due within 3 days (today included).
    pub due_soon: usize,
    /// Due in 4 to 7 days.
    pub due_this_week: usize,
    pub monthly_spending: f64,
    pub yearly_spending: f64,
}
