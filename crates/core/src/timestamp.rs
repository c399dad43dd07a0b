//! Serde adapter for backend timestamps.
//!
//! Columns declared `timestamptz` come back as RFC 3339 with an offset
//! (`2024-05-01T12:34:56.123456+00:00`); plain `timestamp` columns come back
//! without one (`2024-05-01T12:34:56.123456`). Both are accepted and
//! offset-less values are read as UTC.
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct Row {
//!     #[serde(with = "clinic_core::timestamp")]
//!     criado_em: DateTime<Utc>,
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Parse a backend timestamp, with or without an offset.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Postgres renders `+00` rather than `+00:00` in some settings.
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("invalid timestamp: {raw}"))
}
