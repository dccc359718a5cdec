//! Typed access to one collection.
//!
//! Converts between domain types and store documents and rejects documents
//! without an id.

use std::marker::PhantomData;
use std::sync::Arc;

use homedash_domain::types::record::{FOOD_SCHEMA, SUBSCRIPTION_SCHEMA};
use homedash_domain::{CollectionSchema, Food, HomedashError, Result, Subscription};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::ports::{Document, RecordListener, RecordStore};
use super::query::QueryOptions;
use crate::events::ListenerHandle;

/// A domain type stored in a backend collection.
pub trait BackendRecord: DeserializeOwned + Send + Sync + 'static {
    const SCHEMA: CollectionSchema;
}

impl BackendRecord for Food {
    const SCHEMA: CollectionSchema = FOOD_SCHEMA;
}

impl BackendRecord for Subscription {
    const SCHEMA: CollectionSchema = SUBSCRIPTION_SCHEMA;
}

/// Field the backend filters record ids on.
pub const ID_FILTER_FIELD: &str = "objectId";

pub struct RecordRepository<T> {
    store: Arc<dyn RecordStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordRepository<T> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), _record: PhantomData }
    }
}

impl<T: BackendRecord> RecordRepository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, _record: PhantomData }
    }

    pub fn collection(&self) -> &'static str {
        T::SCHEMA.name
    }

    pub async fn list(&self, options: &QueryOptions) -> Result<Vec<T>> {
        self.store.initialize().await?;
        let documents = self.store.query(&T::SCHEMA, options).await?;
        documents.into_iter().map(decode_record).collect()
    }

    /// Every record matching `options`, fetched `page_size` at a time.
    /// `limit` and `skip` in `options` are ignored.
    pub async fn list_all(&self, options: QueryOptions, page_size: u32) -> Result<Vec<T>> {
        let page_size = page_size.max(1);
        let mut records = Vec::new();
        let mut skip = 0_u32;

        loop {
            let page_options = QueryOptions { limit: Some(page_size), skip: Some(skip), ..options.clone() };
            let page = self.list(&page_options).await?;
            let fetched = page.len();
            records.extend(page);

            if fetched < page_size as usize {
                break;
            }
            skip = skip.saturating_add(page_size);
        }

        debug!(collection = T::SCHEMA.name, count = records.len(), "Loaded full collection");
        Ok(records)
    }

    /// Lookup through a filtered list; `None` when nothing matched.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let id = require_id(id)?;
        let options = QueryOptions::new().filter(ID_FILTER_FIELD, id).limit(1);
        Ok(self.list(&options).await?.into_iter().next())
    }

    pub async fn create<I: Serialize + Sync>(&self, input: &I) -> Result<T> {
        let document = to_document(input)?;
        self.store.initialize().await?;
        let created = self.store.create(&T::SCHEMA, document).await?;
        decode_record(created)
    }

    /// Applies `patch` and returns the applied fields plus id and
    /// `updatedAt`; unchanged fields are absent.
    pub async fn update<P: Serialize + Sync>(&self, id: &str, patch: &P) -> Result<T> {
        let id = require_id(id)?;
        let document = to_document(patch)?;
        self.store.initialize().await?;
        let updated = self.store.update(&T::SCHEMA, id, document).await?;
        decode_record(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = require_id(id)?;
        self.store.initialize().await?;
        self.store.delete(&T::SCHEMA, id).await
    }

    pub fn subscribe(&self, listener: RecordListener) -> ListenerHandle {
        self.store.subscribe(T::SCHEMA.name, listener)
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(HomedashError::InvalidInput("record id must not be empty".into()));
    }
    Ok(id)
}

fn to_document<S: Serialize>(value: &S) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(HomedashError::InvalidInput(format!("expected a JSON object, got {other}"))),
    }
}

fn decode_record<T: BackendRecord>(document: Document) -> Result<T> {
    let has_id = document.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty());
    if !has_id {
        return Err(HomedashError::Serialization(format!(
            "{} record without an id",
            T::SCHEMA.name
        )));
    }
    Ok(serde_json::from_value(Value::Object(document))?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn decode_rejects_missing_or_empty_id() {
        let missing = decode_record::<Food>(document(json!({"name": "Milk"})));
        assert!(matches!(missing, Err(HomedashError::Serialization(_))));

        let empty = decode_record::<Food>(document(json!({"id": "", "name": "Milk"})));
        assert!(empty.is_err());
    }

    #[test]
    fn decode_accepts_partial_documents() {
        let food: Food = decode_record(document(json!({"id": "f1", "amount": 0}))).unwrap();
        assert_eq!(food.id, "f1");
        assert_eq!(food.name, None);
    }

    #[test]
    fn ids_are_trimmed_and_required() {
        assert_eq!(require_id(" abc ").unwrap(), "abc");
        assert!(matches!(require_id("  "), Err(HomedashError::InvalidInput(_))));
    }

    #[test]
    fn non_object_inputs_are_rejected() {
        assert!(to_document(&42).is_err());
        assert!(to_document(&json!({"a": 1})).is_ok());
    }
}
