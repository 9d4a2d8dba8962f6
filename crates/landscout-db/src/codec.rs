//! Conversions between domain values and stored column values.
//!
//! Timestamps are RFC 3339 UTC text with microsecond precision, so string
//! order equals chronological order. Nested listing fields are JSON text.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Format a timestamp for storage.
#[must_use]
pub fn to_db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn from_db_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("invalid timestamp '{text}': {e}")))
}

/// Encode an optional value as JSON text.
pub fn encode_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(DatabaseError::from)
}

/// Decode optional JSON text.
pub fn decode_json<T: DeserializeOwned>(column: &str, text: Option<String>) -> Result<Option<T>> {
    text.map(|t| {
        serde_json::from_str(&t)
            .map_err(|e| DatabaseError::Decode(format!("invalid JSON in {column}: {e}")))
    })
    .transpose()
}
