//! Query options understood by the record store.

use serde_json::{json, Value};

use super::ports::Document;

/// Filter, paging, ordering and projection for a collection query.
///
/// `filter` uses the backend's `where` syntax (`$regex`, `$gte`, `$in`,
/// ...). `order` entries are field names, `-` prefixed for descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filter: Document,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub order: Vec<String>,
    pub include: Vec<String>,
    pub keys: Vec<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, condition: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), condition.into());
        self
    }

    /// Case-insensitive substring match; `needle` is matched literally.
    #[must_use]
    pub fn contains_ignore_case(self, field: impl Into<String>, needle: &str) -> Self {
        self.filter(field, json!({ "$regex": regex::escape(needle), "$options": "i" }))
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn order_by(mut self, key: impl Into<String>) -> Self {
        self.order.push(key.into());
        self
    }

    #[must_use]
    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.include.push(field.into());
        self
    }

    /// Restrict returned fields.
    #[must_use]
    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.keys.push(field.into());
        self
    }

    /// `order` as the backend expects it, comma-joined.
    pub fn order_param(&self) -> Option<String> {
        (!self.order.is_empty()).then(|| self.order.join(","))
    }
}

/// Translate a user-facing sort expression into backend order keys.
///
/// Accepts comma-separated fields, each optionally `-` prefixed, and maps
/// aliases to stored field names. Blank input yields `default`.
pub fn resolve_sort(sort: Option<&str>, aliases: &[(&str, &str)], default: &str) -> Vec<String> {
    let keys: Vec<String> = sort
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty() && *key != "-")
        .map(|key| {
            let (prefix, field) = key.strip_prefix('-').map_or(("", key), |field| ("-", field));
            let field = aliases
                .iter()
                .find(|(alias, _)| *alias == field)
                .map_or(field, |(_, stored)| *stored);
            format!("{prefix}{field}")
        })
        .collect();

    if keys.is_empty() {
        vec![default.to_string()]
    } else {
        keys
    }
}
