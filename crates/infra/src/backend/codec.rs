//! Translation between normalised documents and the backend's wire shape.
//!
//! Outbound: reserved fields are stripped and declared date fields are
//! wrapped as tagged dates, including inside `where` operators.
//! Inbound: `objectId` becomes `id` and every tagged date, at any depth,
//! becomes its ISO string.

use homedash_core::Document;
use homedash_domain::{CollectionSchema, WireDate, RESERVED_FIELDS};
use serde_json::Value;

/// Backend field holding the record id.
pub const OBJECT_ID: &str = "objectId";

/// Remove fields the backend assigns itself.
pub fn strip_reserved(mut data: Document) -> Document {
    for field in RESERVED_FIELDS {
        data.remove(*field);
    }
    data
}

/// Encode a create/update payload for `schema`.
pub fn encode_document(schema: &CollectionSchema, data: &Document) -> Document {
    data.iter()
        .map(|(field, value)| {
            let value =
                if schema.is_date_field(field) { encode_date(value) } else { value.clone() };
            (field.clone(), value)
        })
        .collect()
}

/// Encode a `where` filter; `id` is addressed as `objectId`.
pub fn encode_filter(schema: &CollectionSchema, filter: &Document) -> Document {
    encode_document(schema, filter)
        .into_iter()
        .map(|(field, value)| if field == "id" { (OBJECT_ID.to_string(), value) } else { (field, value) })
        .collect()
}

/// Wrap every date-like string inside `value`, recursing through arrays and
/// operator objects. Values that do not parse as dates are left untouched.
fn encode_date(value: &Value) -> Value {
    match value {
        Value::String(raw) => WireDate::parse(raw).map_or_else(|| value.clone(), |wire| wire.to_value()),
        Value::Array(items) => Value::Array(items.iter().map(encode_date).collect()),
        Value::Object(_) if WireDate::from_value(value).is_some() => value.clone(),
        Value::Object(entries) => {
            Value::Object(entries.iter().map(|(key, inner)| (key.clone(), encode_date(inner))).collect())
        }
        other => other.clone(),
    }
}

/// Normalise a document returned by the backend.
pub fn decode_document(raw: Document) -> Document {
    let mut decoded: Document = raw.into_iter().map(|(field, value)| (field, decode_value(value))).collect();
    if let Some(id) = decoded.remove(OBJECT_ID) {
        decoded.entry("id").or_insert(id);
    }
    decoded
}

fn decode_value(value: Value) -> Value {
    if let Some(wire) = WireDate::from_value(&value) {
        return Value::String(wire.iso);
    }
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(decode_value).collect()),
        Value::Object(entries) => {
            Value::Object(entries.into_iter().map(|(key, inner)| (key, decode_value(inner))).collect())
        }
        other => other,
    }
}
