//! Subscription tracking

pub mod service;

pub use service::{summarize_subscriptions, SubscriptionService};
