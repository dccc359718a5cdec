//! # Homedash Core
//!
//! Business logic layer - no HTTP, no file system.
//!
//! This crate contains:
//! - Port interfaces (traits) for the record store, credential exchange and
//!   session persistence
//! - The typed record repository
//! - Food, Subscription and Auth services
//!
//! ## Architecture Principles
//! - Only depends on `homedash-domain`
//! - All external effects via traits
//! - Pure, testable business logic

pub mod auth;
pub mod clock;
pub mod events;
pub mod food;
pub mod records;
pub mod subscriptions;

pub use auth::ports::{AuthGateway, SessionStore};
pub use auth::AuthService;
pub use clock::{Clock, SystemClock};
pub use events::{Listener, ListenerHandle, ListenerRegistry, RecordEvent, RecordEventKind};
pub use food::FoodService;
pub use records::ports::{Document, RecordListener, RecordStore, StoreHealth};
pub use records::query::QueryOptions;
pub use records::repository::{BackendRecord, RecordRepository};
pub use subscriptions::SubscriptionService;
