//! Response normalization.
//!
//! Every body leaving the service passes through [`normalize`]. Timestamps are
//! rewritten to one fixed UTC form; everything else passes through unchanged.
//!
//! # Timestamp form
//! ```text
//! 2024-03-01T12:30:05+00:00
//! ```
//! Second precision, always converted to UTC, offset always written as
//! `+00:00`. Instants without zone information are taken to be UTC. They are
//! never interpreted in the host's local zone.
//!
//! # Design Decisions
//! - Pure: no I/O, no clock reads, no errors
//! - Non-finite floats have no JSON form and become `null`
//! - Typed response structs use [`utc`] to get the same timestamp form

pub mod utc;
pub mod value;

pub use value::{ResponseValue, Timestamp, ToResponseValue};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};

/// `strftime` pattern of the canonical timestamp form.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// The UTC instant a timestamp denotes.
pub fn to_utc(timestamp: &Timestamp) -> DateTime<Utc> {
    match timestamp {
        Timestamp::Utc(dt) => *dt,
        Timestamp::Offset(dt) => dt.with_timezone(&Utc),
        Timestamp::Naive(naive) => Utc.from_utc_datetime(naive),
    }
}

/// Canonical text of a timestamp.
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    to_utc(timestamp).format(TIMESTAMP_FORMAT).to_string()
}

/// Rewrite a value tree into JSON with canonical timestamps.
pub fn normalize(value: &ResponseValue) -> Value {
    match value {
        ResponseValue::Null => Value::Null,
        ResponseValue::Bool(b) => Value::Bool(*b),
        ResponseValue::Int(i) => Value::Number((*i).into()),
        ResponseValue::UInt(u) => Value::Number((*u).into()),
        ResponseValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        ResponseValue::String(s) => Value::String(s.clone()),
        ResponseValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
        ResponseValue::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        ResponseValue::Object(fields) => {
            let mut map = Map::with_capacity(fields.len());
            for (key, field) in fields {
                map.insert(key.clone(), normalize(field));
            }
            Value::Object(map)
        }
    }
}

/// Normalize and render to a JSON string.
pub fn normalize_to_string(value: &ResponseValue) -> String {
    normalize(value).to_string()
}
