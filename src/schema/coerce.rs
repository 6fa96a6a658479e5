//! Lenient field decoding for form submissions.
//!
//! HTML forms post numbers as strings and leave unused inputs as `""`. These
//! helpers accept both shapes and map blank input to "not provided".

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

use crate::storage::EntityId;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

fn blank_to_none(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the date formats the site's forms produce: RFC 3339,
/// `datetime-local` (`2024-05-01T09:30`) and plain dates (midnight UTC).
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(d)? {
        None => None,
        Some(Scalar::Text(s)) => blank_to_none(s),
        Some(Scalar::Int(n)) => Some(n.to_string()),
        Some(Scalar::Float(f)) => Some(f.to_string()),
        Some(Scalar::Bool(b)) => Some(b.to_string()),
    })
}

pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => i32::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("number {} is out of range", n))),
        Some(Scalar::Text(s)) => match blank_to_none(s) {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a whole number, got `{}`", s))),
        },
        Some(Scalar::Float(f)) if f.fract() == 0.0 && f.abs() <= i32::MAX as f64 => {
            Ok(Some(f as i32))
        }
        Some(_) => Err(D::Error::custom("expected a whole number")),
    }
}

/// Like [`opt_i32`] but for fields with a `#[serde(default = ...)]`.
pub fn lenient_i32<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    opt_i32(d).map(|n| n.unwrap_or_default())
}

pub fn opt_entity_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<EntityId>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Int(n)) => u64::try_from(n)
            .map(|n| Some(EntityId::Num(n)))
            .map_err(|_| D::Error::custom("identifier must not be negative")),
        Some(Scalar::Text(s)) => Ok(blank_to_none(s).map(EntityId::from)),
        Some(_) => Err(D::Error::custom("expected an identifier")),
    }
}

pub fn opt_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(d)?.and_then(blank_to_none) {
        None => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date `{}`", s))),
    }
}

pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(d)?.and_then(blank_to_none) {
        None => Ok(None),
        Some(s) => parse_datetime(&s)
            .map(|dt| Some(dt.date_naive()))
            .ok_or_else(|| D::Error::custom(format!("invalid date `{}`", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_string")]
        text: Option<String>,
        #[serde(default, deserialize_with = "opt_i32")]
        number: Option<i32>,
        #[serde(default, deserialize_with = "opt_entity_id")]
        id: Option<EntityId>,
    }

    #[test]
    fn test_parse_datetime_formats() {
        let full = parse_datetime("2024-05-01T09:30:00Z").unwrap();
        assert_eq!(full.hour(), 9);

        let local = parse_datetime("2024-05-01T09:30").unwrap();
        assert_eq!(local.minute(), 30);

        let day = parse_datetime("2024-05-01").unwrap();
        assert_eq!(day.day(), 1);
        assert_eq!(day.hour(), 0);

        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn test_blank_and_numeric_strings() {
        let probe: Probe = serde_json::from_value(json!({
            "text": "  ",
            "number": "12",
            "id": "",
        }))
        .unwrap();
        assert!(probe.text.is_none());
        assert_eq!(probe.number, Some(12));
        assert!(probe.id.is_none());

        let probe: Probe = serde_json::from_value(json!({ "text": 99, "id": 4 })).unwrap();
        assert_eq!(probe.text.as_deref(), Some("99"));
        assert_eq!(probe.id, Some(EntityId::Num(4)));
    }

    #[test]
    fn test_non_numeric_string_is_rejected() {
        let result: Result<Probe, _> = serde_json::from_value(json!({ "number": "five" }));
        assert!(result.is_err());
    }
}
