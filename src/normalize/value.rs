//! Value tree handed to the normalizer.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// A point in time, with or without zone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Already in UTC.
    Utc(DateTime<Utc>),
    /// Carries an explicit offset, possibly non-zero.
    Offset(DateTime<FixedOffset>),
    /// No zone information. Interpreted as UTC, never as local time.
    Naive(NaiveDateTime),
}

/// A response body before normalization.
///
/// Object keys keep their insertion order while building; a repeated key
/// overwrites the earlier one when normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Timestamp(Timestamp),
    Array(Vec<ResponseValue>),
    Object(Vec<(String, ResponseValue)>),
}

impl ResponseValue {
    /// An empty object.
    pub fn object() -> Self {
        ResponseValue::Object(Vec::new())
    }

    /// Append a field. On anything other than an object this is a no-op.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ResponseValue>) -> Self {
        if let ResponseValue::Object(fields) = &mut self {
            fields.push((key.into(), value.into()));
        }
        self
    }

    /// Append a field only when `value` is present.
    pub fn with_optional_field<V>(self, key: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<ResponseValue>,
    {
        match value {
            Some(v) => self.with_field(key, v),
            None => self,
        }
    }

    /// Look up a field of an object by key.
    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        match self {
            ResponseValue::Object(fields) => fields
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for ResponseValue {
    fn from(v: bool) -> Self {
        ResponseValue::Bool(v)
    }
}

impl From<i64> for ResponseValue {
    fn from(v: i64) -> Self {
        ResponseValue::Int(v)
    }
}

impl From<u64> for ResponseValue {
    fn from(v: u64) -> Self {
        ResponseValue::UInt(v)
    }
}

impl From<f64> for ResponseValue {
    fn from(v: f64) -> Self {
        ResponseValue::Float(v)
    }
}

impl From<&str> for ResponseValue {
    fn from(v: &str) -> Self {
        ResponseValue::String(v.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(v: String) -> Self {
        ResponseValue::String(v)
    }
}

impl From<DateTime<Utc>> for ResponseValue {
    fn from(v: DateTime<Utc>) -> Self {
        ResponseValue::Timestamp(Timestamp::Utc(v))
    }
}

impl From<DateTime<FixedOffset>> for ResponseValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        ResponseValue::Timestamp(Timestamp::Offset(v))
    }
}

impl From<NaiveDateTime> for ResponseValue {
    fn from(v: NaiveDateTime) -> Self {
        ResponseValue::Timestamp(Timestamp::Naive(v))
    }
}

impl<T: Into<ResponseValue>> From<Vec<T>> for ResponseValue {
    fn from(items: Vec<T>) -> Self {
        ResponseValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ResponseValue>> From<Option<T>> for ResponseValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ResponseValue::Null)
    }
}

/// Conversion of a domain type into a response tree.
pub trait ToResponseValue {
    fn to_response_value(&self) -> ResponseValue;
}
