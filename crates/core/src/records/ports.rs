//! Port interface for the remote record store
//!
//! Documents crossing this boundary are already normalised: the record id is
//! under `id` and dates are plain ISO-8601 strings. Wire encodings are the
//! adapter's concern.

use async_trait::async_trait;
use homedash_domain::{CollectionSchema, Result};
use serde::Serialize;

use super::query::QueryOptions;
use crate::events::{ListenerHandle, RecordEvent};

/// A JSON object as exchanged with the store.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Change-feed callback.
pub type RecordListener = crate::events::Listener<RecordEvent>;

/// Connectivity report for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub initialized: bool,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreHealth {
    pub fn healthy() -> Self {
        Self { initialized: true, reachable: true, error: None }
    }

    pub fn is_healthy(&self) -> bool {
        self.initialized && self.reachable
    }
}

/// CRUD access to named collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Idempotent; safe to call before every operation.
    async fn initialize(&self) -> Result<()>;

    async fn query(&self, schema: &CollectionSchema, options: &QueryOptions) -> Result<Vec<Document>>;

    /// Returns `data` merged with `id`, `createdAt` and `updatedAt`.
    async fn create(&self, schema: &CollectionSchema, data: Document) -> Result<Document>;

    /// Returns `data` merged with `id` and the new `updatedAt`.
    async fn update(&self, schema: &CollectionSchema, id: &str, data: Document) -> Result<Document>;

    async fn delete(&self, schema: &CollectionSchema, id: &str) -> Result<()>;

    /// Register for successful writes to `collection`.
    fn subscribe(&self, collection: &str, listener: RecordListener) -> ListenerHandle;

    async fn health(&self) -> StoreHealth;
}
