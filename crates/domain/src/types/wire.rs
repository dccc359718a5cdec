//! The backend's tagged date structure, `{"__type": "Date", "iso": "..."}`.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dates::parse_instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum DateTag {
    Date,
}

/// A date as the backend stores it.
///
/// `iso` is always UTC with millisecond precision,
/// e.g. `2025-01-05T00:00:00.000Z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDate {
    #[serde(rename = "__type")]
    tag: DateTag,
    pub iso: String,
}

impl WireDate {
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self { tag: DateTag::Date, iso: instant.to_rfc3339_opts(SecondsFormat::Millis, true) }
    }

    /// Midnight UTC of `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_instant(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Accepts a plain `YYYY-MM-DD` date or any RFC 3339 instant.
    pub fn parse(input: &str) -> Option<Self> {
        parse_instant(input).map(Self::from_instant)
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.iso).ok().map(|dt| dt.with_timezone(&Utc))
    }

    /// Recognizes a tagged date inside arbitrary JSON.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.get("__type").and_then(Value::as_str) != Some("Date") {
            return None;
        }
        let iso = object.get("iso")?.as_str()?;
        Some(Self { tag: DateTag::Date, iso: iso.to_string() })
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "__type": "Date", "iso": self.iso })
    }
}
