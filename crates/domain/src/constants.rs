//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Connection
pub const SECURE_SCHEME_PREFIX: &str = "https://";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

// Outbound HTTP defaults
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

// Collections
pub const SUBSCRIPTION_COLLECTION: &str = "subscription";
pub const FOOD_COLLECTION: &str = "food";

// Listing
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const STATS_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SORT: &str = "-createdAt";

// Expiry windows (days)
pub const DEFAULT_EXPIRING_WINDOW_DAYS: i64 = 7;
pub const FOOD_EXPIRING_SOON_DAYS: i64 = 7;
pub const FOOD_EXPIRING_LATER_DAYS: i64 = 30;
pub const SUBSCRIPTION_DUE_SOON_DAYS: i64 = 3;
pub const SUBSCRIPTION_DUE_WEEK_DAYS: i64 = 7;

pub const UNCATEGORIZED: &str = "uncategorized";
