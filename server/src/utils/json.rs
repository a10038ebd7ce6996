//! JSON utility functions
//!
//! Lenient numeric coercion for feed payloads. Collectors emit counts as
//! numbers, numeric strings, or garbage; anything unusable becomes zero.

use serde_json::Value as JsonValue;

/// Coerce a JSON value into a non-negative integer count.
///
/// Numbers and numeric strings are accepted (fractions are truncated);
/// negative, non-finite, and non-numeric values yield 0.
pub fn lenient_u64(value: &JsonValue) -> u64 {
    match value {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(float_to_count))
            .unwrap_or(0),
        JsonValue::String(s) => parse_count_str(s),
        _ => 0,
    }
}

/// Coerce a JSON value into a finite float, 0.0 when unusable
pub fn lenient_f64(value: &JsonValue) -> f64 {
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn parse_count_str(s: &str) -> u64 {
    let s = s.trim();
    s.parse::<u64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(float_to_count))
        .unwrap_or(0)
}

fn float_to_count(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}
