//! Domain types and models

pub mod api;
pub mod dates;
pub mod food;
pub mod record;
pub mod subscription;
pub mod user;
pub mod wire;

pub use api::{ApiFailure, ApiResult};
pub use food::{Food, FoodPatch, FoodQuery, FoodStats, FoodStatus, NewFood};
pub use record::{CollectionSchema, FOOD_SCHEMA, RESERVED_FIELDS, SUBSCRIPTION_SCHEMA};
pub use subscription::{
    BillingCycle, NewSubscription, Subscription, SubscriptionPatch, SubscriptionQuery,
    SubscriptionStats, SubscriptionStatus,
};
pub use user::{AuthState, Credentials, UserRecord};
pub use wire::WireDate;
