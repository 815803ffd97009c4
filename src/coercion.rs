//! Primitive text coercion
//!
//! This module provides the render/parse pairs shared by the envelope
//! marshaler and unmarshaler. Both directions must stay consistent: a
//! value rendered here always parses back to the same value.

use crate::error::{Error, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// dateTime wire profile: ISO-8601-like with an explicit UTC offset,
/// e.g. `2024-01-15T10:30:00+00:00`
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

lazy_static::lazy_static! {
    /// XSD boolean token mapping
    pub static ref XSD_BOOLEAN_MAP: HashMap<&'static str, bool> = {
        let mut m = HashMap::new();
        m.insert("false", false);
        m.insert("0", false);
        m.insert("true", true);
        m.insert("1", true);
        m
    };
}

// =============================================================================
// Boolean
// =============================================================================

/// Render a boolean as its lowercase wire token
pub fn render_boolean(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Parse a boolean from wire text
///
/// Accepts the XSD tokens (`true`/`false`/`1`/`0`) and otherwise compares
/// case-insensitively against `true`. Total: unrecognized text is false,
/// never an error.
pub fn parse_boolean(value: &str) -> bool {
    let trimmed = value.trim();
    match XSD_BOOLEAN_MAP.get(trimmed) {
        Some(b) => *b,
        None => trimmed.eq_ignore_ascii_case("true"),
    }
}

// =============================================================================
// Integers
// =============================================================================

/// Render an integer in canonical decimal form
pub fn render_int(value: i64) -> String {
    value.to_string()
}

/// Parse a 64-bit integer from wire text
pub fn parse_long(value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::Value(format!("'{}' is not a valid integer value", value)))
}

/// Parse a 32-bit integer from wire text (xs:int range)
pub fn parse_int(value: &str) -> Result<i64> {
    let parsed = parse_long(value)?;
    if !(-2147483648..=2147483647).contains(&parsed) {
        return Err(Error::Value(format!(
            "'{}' is out of range for a 32-bit integer",
            value
        )));
    }
    Ok(parsed)
}

// =============================================================================
// Floats
// =============================================================================

/// Render a float in canonical decimal form, with the XSD spellings of
/// the non-finite values
pub fn render_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

/// Parse a float from wire text (locale-independent)
pub fn parse_float(value: &str) -> Result<f64> {
    match value.trim() {
        "NaN" => Ok(f64::NAN),
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        trimmed => trimmed
            .parse::<f64>()
            .map_err(|_| Error::Value(format!("'{}' is not a valid float value", value))),
    }
}

// =============================================================================
// dateTime
// =============================================================================

/// The default dateTime value (Unix epoch, UTC)
pub fn epoch_datetime() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Render a dateTime in the wire profile
///
/// Values are normalized to UTC, so the offset is always `+00:00`.
pub fn render_datetime(value: &DateTime<Utc>) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Parse a dateTime from wire text
///
/// Expects the wire profile; falls back to RFC 3339 so responders that
/// send `Z` or fractional seconds still parse. The instant is preserved
/// and normalized to UTC.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
        return Ok(parsed.with_timezone(&Utc));
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| Error::Value(format!("'{}' is not a valid dateTime value", value)))
}

// =============================================================================
// base64Binary
// =============================================================================

/// Render binary content as standard base64
pub fn render_base64(value: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(value)
}

/// Parse standard base64 wire text into bytes
///
/// Whitespace inside the encoding is tolerated; empty text is an empty
/// byte sequence.
pub fn parse_base64(value: &str) -> Result<Vec<u8>> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }

    base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map_err(|_| Error::Value(format!("'{}' is not a valid base64 encoding", value)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_boolean_round_trip() {
        assert_eq!(render_boolean(true), "true");
        assert_eq!(render_boolean(false), "false");

        assert!(parse_boolean("true"));
        assert!(parse_boolean("TRUE"));
        assert!(parse_boolean("True"));
        assert!(parse_boolean("1"));
        assert!(!parse_boolean("false"));
        assert!(!parse_boolean("0"));
        assert!(!parse_boolean("yes"));
        assert!(!parse_boolean(""));
    }

    #[test]
    fn test_int_round_trip() {
        assert_eq!(render_int(123), "123");
        assert_eq!(render_int(-456), "-456");

        assert_eq!(parse_long("123").unwrap(), 123);
        assert_eq!(parse_long(" -456 ").unwrap(), -456);
        assert!(parse_long("abc").is_err());
    }

    #[test]
    fn test_int_range() {
        assert_eq!(parse_int("2147483647").unwrap(), 2147483647);
        assert_eq!(parse_int("-2147483648").unwrap(), -2147483648);
        assert!(parse_int("2147483648").is_err());
        assert!(parse_long("2147483648").is_ok());
    }

    #[test]
    fn test_float_round_trip() {
        assert_eq!(render_float(f64::NAN), "NaN");
        assert_eq!(render_float(f64::INFINITY), "INF");
        assert_eq!(render_float(f64::NEG_INFINITY), "-INF");
        assert_eq!(render_float(123.456), "123.456");

        assert!(parse_float("NaN").unwrap().is_nan());
        assert_eq!(parse_float("INF").unwrap(), f64::INFINITY);
        assert_eq!(parse_float("-INF").unwrap(), f64::NEG_INFINITY);
        assert_eq!(parse_float("123.456").unwrap(), 123.456);
        assert!(parse_float("abc").is_err());
    }

    #[test]
    fn test_datetime_format() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(render_datetime(&dt), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_datetime_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let rendered = render_datetime(&dt);
        assert_eq!(parse_datetime(&rendered).unwrap(), dt);
    }

    #[test]
    fn test_datetime_offset_normalized() {
        // Same instant, different offset spelling
        let parsed = parse_datetime("2024-01-15T19:30:00+09:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_datetime_rfc3339_fallback() {
        let parsed = parse_datetime("2024-01-15T10:30:00Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parsed, expected);

        assert!(parse_datetime("January 15th").is_err());
    }

    #[test]
    fn test_base64_round_trip() {
        assert_eq!(render_base64(b"Hello"), "SGVsbG8=");
        assert_eq!(parse_base64("SGVsbG8=").unwrap(), b"Hello");
        assert_eq!(parse_base64("SGVs bG8=").unwrap(), b"Hello");
        assert_eq!(parse_base64("").unwrap(), Vec::<u8>::new());
        assert!(parse_base64("!!!").is_err());
    }
}
