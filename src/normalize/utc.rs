//! Serde helpers for `DateTime<Utc>` fields in the canonical form.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Event {
//!     #[serde(with = "crate::normalize::utc")]
//!     at: DateTime<Utc>,
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

use crate::normalize::TIMESTAMP_FORMAT;

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}

/// Accepts any RFC 3339 offset and converts to UTC.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(de::Error::custom)
}

/// The same form for `Option<DateTime<Utc>>`; `None` is `null`.
pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => super::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| {
                DateTime::parse_from_rfc3339(&text)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(de::Error::custom)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Event {
        #[serde(with = "crate::normalize::utc")]
        at: DateTime<Utc>,
        #[serde(with = "crate::normalize::utc::option", default)]
        resolved_at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_fields_serialize_in_canonical_form() {
        let event = Event {
            at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            resolved_at: None,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["at"], "2024-03-01T12:30:05+00:00");
        assert!(json["resolved_at"].is_null());
    }

    #[test]
    fn test_sub_second_precision_is_dropped() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        let event = Event { at, resolved_at: Some(at) };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["at"], "2024-03-01T12:30:05+00:00");
        assert_eq!(json["resolved_at"], "2024-03-01T12:30:05+00:00");
    }

    #[test]
    fn test_offsets_are_read_back_as_utc() {
        let event: Event = serde_json::from_str(
            r#"{"at": "2024-03-01T14:30:05+02:00", "resolved_at": "2024-03-01T12:31:00Z"}"#,
        )
        .unwrap();

        assert_eq!(event.at, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap());
        assert_eq!(
            event.resolved_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 31, 0).unwrap())
        );
        assert!(serde_json::from_str::<Event>(r#"{"at": "yesterday"}"#).is_err());
    }
}
