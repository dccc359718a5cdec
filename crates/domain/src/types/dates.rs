//! Date parsing shared by the record types and the wire encoding.
//!
//! Date-only record fields (`todate`, `nextdate`) are exposed as
//! `YYYY-MM-DD` but accept a full ISO-8601 instant on input.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a plain date, or the UTC calendar date of an RFC 3339 instant.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .ok()
        .or_else(|| parse_rfc3339(input).map(|instant| instant.date_naive()))
}

/// Parse an RFC 3339 instant, or a plain date as midnight UTC.
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    parse_rfc3339(input).or_else(|| {
        NaiveDate::parse_from_str(input, DATE_FORMAT)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    })
}

fn parse_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for `Option<NaiveDate>` record fields.
pub mod optional_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_date, DATE_FORMAT};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DateInput {
        Text(String),
        Tagged { iso: String },
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let text = match Option::<DateInput>::deserialize(deserializer)? {
            None => return Ok(None),
            Some(DateInput::Text(text)) if text.trim().is_empty() => return Ok(None),
            Some(DateInput::Text(text) | DateInput::Tagged { iso: text }) => text,
        };
        parse_date(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date '{text}', expected YYYY-MM-DD or ISO-8601")))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(default, with = "optional_date", skip_serializing_if = "Option::is_none")]
        due: Option<NaiveDate>,
    }

    #[test]
    fn accepts_date_instant_and_tagged() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 5);
        for input in [
            json!({"due": "2025-01-05"}),
            json!({"due": "2025-01-05T00:00:00.000Z"}),
            json!({"due": {"__type": "Date", "iso": "2025-01-05T00:00:00.000Z"}}),
        ] {
            let holder: Holder = serde_json::from_value(input).unwrap();
            assert_eq!(holder.due, expected);
        }
    }

    #[test]
    fn missing_null_and_blank_are_none() {
        for input in [json!({}), json!({"due": null}), json!({"due": ""})] {
            let holder: Holder = serde_json::from_value(input).unwrap();
            assert_eq!(holder.due, None);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_value::<Holder>(json!({"due": "soon"})).is_err());
    }

    #[test]
    fn serializes_as_plain_date() {
        let holder = Holder { due: NaiveDate::from_ymd_opt(2024, 2, 29) };
        assert_eq!(serde_json::to_value(&holder).unwrap(), json!({"due": "2024-02-29"}));
    }

    #[test]
    fn instant_offsets_resolve_to_utc_date() {
        assert_eq!(parse_date("2025-01-01T01:00:00+03:00"), NaiveDate::from_ymd_opt(2024, 12, 31));
    }
}
