//! Time utility functions

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

/// Timestamps at or above this magnitude are treated as milliseconds, below as seconds.
/// 10^11 ms is early 1973; 10^11 s is far beyond any plausible event time.
const MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Convert milliseconds since Unix epoch to DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Convert an epoch number of unknown unit (seconds or milliseconds) to DateTime<Utc>
pub fn epoch_to_datetime(value: i64) -> Option<DateTime<Utc>> {
    if value.unsigned_abs() >= MILLIS_THRESHOLD {
        millis_to_datetime(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// Parse a timestamp string.
///
/// Accepts RFC 3339 / ISO 8601 (`2024-01-15T10:30:00Z`), SQL-style naive
/// timestamps interpreted as UTC (`2024-01-15 10:30:00`), and bare epoch
/// numbers. Returns `None` when nothing matches.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, format) {
            return Some(naive.and_utc());
        }
    }

    ts.parse::<i64>().ok().and_then(epoch_to_datetime)
}

/// Parse a JSON timestamp value (string or epoch number)
pub fn parse_timestamp_value(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => parse_timestamp(s),
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(epoch_to_datetime),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_millis_to_datetime_epoch() {
        let dt = millis_to_datetime(0).unwrap();
        assert_eq!(dt, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_epoch_to_datetime_detects_unit() {
        // 2024-01-01 00:00:00 UTC
        let secs = 1_704_067_200_i64;
        assert_eq!(epoch_to_datetime(secs), epoch_to_datetime(secs * 1000));
        assert_eq!(epoch_to_datetime(secs).unwrap().year(), 2024);
    }

    #[test]
    fn test_epoch_to_datetime_extremes() {
        assert!(epoch_to_datetime(i64::MIN).is_none());
        assert!(epoch_to_datetime(i64::MAX).is_none());
        assert!(parse_timestamp_value(&json!(i64::MIN)).is_none());
        assert!(parse_timestamp_value(&json!(-1e300)).is_none());
        assert!(parse_timestamp("-9223372036854775808").is_none());
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let dt = parse_timestamp("2024-01-15T10:30:00+05:00").unwrap();
        assert_eq!(dt.hour(), 5);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_naive_sql() {
        let dt = parse_timestamp("2024-01-15 10:30:00.250").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_timestamp_epoch_string() {
        let dt = parse_timestamp("1704067200000").unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("not-a-timestamp").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
    }

    #[test]
    fn test_parse_timestamp_value_variants() {
        assert!(parse_timestamp_value(&json!("2024-01-15T10:30:00Z")).is_some());
        assert!(parse_timestamp_value(&json!(1_704_067_200_000_i64)).is_some());
        assert!(parse_timestamp_value(&json!(null)).is_none());
        assert!(parse_timestamp_value(&json!({"at": 1})).is_none());
        assert!(parse_timestamp_value(&json!(true)).is_none());
    }
}
