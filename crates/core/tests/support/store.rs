//! In-memory `RecordStore` understanding the subset of the backend's
//! `where` syntax used by the services.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use homedash_core::{
    Document, ListenerHandle, ListenerRegistry, QueryOptions, RecordEvent, RecordEventKind,
    RecordListener, RecordStore, StoreHealth,
};
use homedash_domain::{CollectionSchema, HomedashError, Result};
use parking_lot::Mutex;
use regex::RegexBuilder;
use serde_json::{json, Value};

pub const CREATED_AT: &str = "2025-01-01T00:00:00.000Z";
pub const UPDATED_AT: &str = "2025-01-02T00:00:00.000Z";

#[derive(Default)]
pub struct InMemoryRecordStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    next_id: AtomicU64,
    listeners: ListenerRegistry<RecordEvent>,
    failing_updates: Mutex<HashSet<String>>,
    queries: Mutex<Vec<QueryOptions>>,
    initialize_calls: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document as if it already existed on the backend.
    pub fn seed(&self, collection: &str, record: Value) -> String {
        let mut document = record.as_object().cloned().expect("seed must be an object");
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| self.allocate_id());
        document.insert("id".into(), json!(id));
        document.entry("createdAt").or_insert_with(|| json!(CREATED_AT));
        document.entry("updatedAt").or_insert_with(|| json!(CREATED_AT));
        self.collections.lock().entry(collection.to_string()).or_default().push(document);
        id
    }

    pub fn fail_updates_for(&self, id: &str) {
        self.failing_updates.lock().insert(id.to_string());
    }

    pub fn stored(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc_id(doc) == Some(id)).cloned())
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections.lock().get(collection).map_or(0, Vec::len)
    }

    pub fn queries(&self) -> Vec<QueryOptions> {
        self.queries.lock().clone()
    }

    pub fn last_query(&self) -> QueryOptions {
        self.queries.lock().last().cloned().expect("no query recorded")
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(AtomicOrdering::SeqCst)
    }

    fn allocate_id(&self) -> String {
        format!("rec{}", self.next_id.fetch_add(1, AtomicOrdering::SeqCst))
    }

    fn not_found() -> HomedashError {
        HomedashError::client(404, "Object not found.")
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn initialize(&self) -> Result<()> {
        self.initialize_calls.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    async fn query(&self, schema: &CollectionSchema, options: &QueryOptions) -> Result<Vec<Document>> {
        self.queries.lock().push(options.clone());

        let mut matched: Vec<Document> = self
            .collections
            .lock()
            .get(schema.name)
            .map(|docs| docs.iter().filter(|doc| matches_filter(doc, &options.filter)).cloned().collect())
            .unwrap_or_default();

        matched.sort_by(|a, b| compare_by_order(a, b, &options.order));

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options.limit.map_or(usize::MAX, |limit| limit as usize);
        let page = matched.into_iter().skip(skip).take(limit);

        Ok(page
            .map(|doc| {
                if options.keys.is_empty() {
                    doc
                } else {
                    doc.into_iter()
                        .filter(|(key, _)| key == "id" || options.keys.contains(key))
                        .collect()
                }
            })
            .collect())
    }

    async fn create(&self, schema: &CollectionSchema, mut data: Document) -> Result<Document> {
        for reserved in ["id", "objectId", "createdAt", "updatedAt"] {
            data.remove(reserved);
        }
        let id = self.allocate_id();
        data.insert("id".into(), json!(id));
        data.insert("createdAt".into(), json!(CREATED_AT));
        data.insert("updatedAt".into(), json!(CREATED_AT));

        self.collections.lock().entry(schema.name.to_string()).or_default().push(data.clone());
        self.listeners.emit(&RecordEvent::new(RecordEventKind::Created, schema.name, data.clone()));
        Ok(data)
    }

    async fn update(&self, schema: &CollectionSchema, id: &str, mut data: Document) -> Result<Document> {
        if self.failing_updates.lock().contains(id) {
            return Err(HomedashError::Network("HTTP 503: Service Unavailable".into()));
        }
        for reserved in ["id", "objectId", "createdAt", "updatedAt"] {
            data.remove(reserved);
        }

        {
            let mut collections = self.collections.lock();
            let stored = collections
                .get_mut(schema.name)
                .and_then(|docs| docs.iter_mut().find(|doc| doc_id(doc) == Some(id)))
                .ok_or_else(Self::not_found)?;
            for (key, value) in &data {
                stored.insert(key.clone(), value.clone());
            }
            stored.insert("updatedAt".into(), json!(UPDATED_AT));
        }

        data.insert("id".into(), json!(id));
        data.insert("updatedAt".into(), json!(UPDATED_AT));
        self.listeners.emit(&RecordEvent::new(RecordEventKind::Updated, schema.name, data.clone()));
        Ok(data)
    }

    async fn delete(&self, schema: &CollectionSchema, id: &str) -> Result<()> {
        {
            let mut collections = self.collections.lock();
            let docs = collections.get_mut(schema.name).ok_or_else(Self::not_found)?;
            let before = docs.len();
            docs.retain(|doc| doc_id(doc) != Some(id));
            if docs.len() == before {
                return Err(Self::not_found());
            }
        }

        let mut record = Document::new();
        record.insert("id".into(), json!(id));
        self.listeners.emit(&RecordEvent::new(RecordEventKind::Deleted, schema.name, record));
        Ok(())
    }

    fn subscribe(&self, collection: &str, listener: RecordListener) -> ListenerHandle {
        let collection = collection.to_string();
        self.listeners.subscribe(std::sync::Arc::new(move |event: &RecordEvent| {
            if event.collection == collection {
                listener(event);
            }
        }))
    }

    async fn health(&self) -> StoreHealth {
        StoreHealth::healthy()
    }
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, condition)| {
        let field = if field == "objectId" { "id" } else { field.as_str() };
        matches_condition(doc.get(field), condition)
    })
}

fn matches_condition(value: Option<&Value>, condition: &Value) -> bool {
    let Some(operators) = condition.as_object().filter(|ops| ops.keys().all(|k| k.starts_with('$')))
    else {
        return value == Some(condition);
    };

    operators.iter().all(|(operator, operand)| match operator.as_str() {
        "$regex" => {
            let insensitive = operators.get("$options").and_then(Value::as_str).is_some_and(|o| o.contains('i'));
            let pattern = operand.as_str().unwrap_or_default();
            let regex = RegexBuilder::new(pattern).case_insensitive(insensitive).build().expect("valid regex");
            value.and_then(Value::as_str).is_some_and(|text| regex.is_match(text))
        }
        "$options" => true,
        "$gte" => compare(value, operand).is_some_and(Ordering::is_ge),
        "$gt" => compare(value, operand).is_some_and(Ordering::is_gt),
        "$lte" => compare(value, operand).is_some_and(Ordering::is_le),
        "$lt" => compare(value, operand).is_some_and(Ordering::is_lt),
        "$ne" => value != Some(operand),
        "$in" => value.is_some_and(|v| operand.as_array().is_some_and(|set| set.contains(v))),
        "$nin" => !value.is_some_and(|v| operand.as_array().is_some_and(|set| set.contains(v))),
        other => panic!("unsupported operator {other}"),
    })
}

fn compare(value: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (value?, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn compare_by_order(a: &Document, b: &Document, order: &[String]) -> Ordering {
    for key in order {
        let (descending, field) = key.strip_prefix('-').map_or((false, key.as_str()), |f| (true, f));
        let ordering = match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => compare(Some(x), y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = if descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
