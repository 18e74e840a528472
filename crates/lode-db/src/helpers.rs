//! Row-to-entity parsing helpers.
//!
//! Every repo module converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle the dual
//! datetime format issue (`SQLite`'s `datetime('now')` vs Rust's
//! `to_rfc3339()`), plus the vector-literal codec for embedding columns.

use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s
/// default format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all lode-core enums regardless of their rename convention.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// Nullable columns must use `get::<Option<String>>()`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Parse a required JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the column contains invalid JSON.
pub fn parse_json(s: &str) -> Result<serde_json::Value, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON column: {e}")))
}

/// Format a float slice as the vector literal `vector32()` accepts: `[0.1,0.2,…]`.
#[must_use]
pub fn format_vector(v: &[f32]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(v.len() * 10 + 2);
    s.push('[');
    for (i, x) in v.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        let _ = write!(s, "{x}");
    }
    s.push(']');
    s
}

/// Parse a vector literal (`vector_extract()` output) back into floats.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the text is not a bracketed float list.
pub fn parse_vector(text: &str) -> Result<Vec<f32>, DatabaseError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| DatabaseError::Query(format!("Invalid vector literal: {text}")))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| DatabaseError::Query(format!("Invalid vector element '{part}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn datetime_both_formats() {
        assert!(parse_datetime("2026-02-09T14:30:00+00:00").is_ok());
        assert!(parse_datetime("2026-02-09 14:30:00").is_ok());
        assert!(parse_datetime("not a date").is_err());
    }

    #[test]
    fn vector_roundtrip() {
        let v = vec![0.5_f32, -1.25, 3.0];
        let text = format_vector(&v);
        assert_eq!(text, "[0.5,-1.25,3]");
        assert_eq!(parse_vector(&text).unwrap(), v);
    }

    #[test]
    fn vector_empty() {
        assert_eq!(format_vector(&[]), "[]");
        assert!(parse_vector("[]").unwrap().is_empty());
    }
}
