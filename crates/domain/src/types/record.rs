//! Collection descriptors shared by the repository and the REST adapter.

use crate::constants::{FOOD_COLLECTION, SUBSCRIPTION_COLLECTION};

/// A named backend collection and the fields stored as tagged dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub date_fields: &'static [&'static str],
}

impl CollectionSchema {
    pub const fn new(name: &'static str, date_fields: &'static [&'static str]) -> Self {
        Self { name, date_fields }
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.contains(&field)
    }
}

pub const FOOD_SCHEMA: CollectionSchema = CollectionSchema::new(FOOD_COLLECTION, &["todate"]);

pub const SUBSCRIPTION_SCHEMA: CollectionSchema =
    CollectionSchema::new(SUBSCRIPTION_COLLECTION, &["nextdate"]);

/// Fields managed by the backend; never sent on create or update.
pub const RESERVED_FIELDS: &[&str] = &["id", "objectId", "createdAt", "updatedAt"];
