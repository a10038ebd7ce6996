//! Wire-to-domain record normalisation
//!
//! An event must carry a non-empty event type and a parseable creation
//! time; anything else about it is optional. Rejected records are counted,
//! never fatal.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::types::{EndpointMetric, EventData, EventRecord, EventValue, ResponseTimeSample};
use crate::data::types::{Lenient, RawEndpointMetric, RawEventRecord};
use crate::utils::json::{lenient_f64, lenient_u64};
use crate::utils::time::parse_timestamp_value;

/// Events that passed validation plus the number that did not
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEvents {
    pub events: Vec<EventRecord>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEndpoints {
    pub metrics: Vec<EndpointMetric>,
    pub skipped: usize,
}

pub fn normalize_events<I>(records: I) -> NormalizedEvents
where
    I: IntoIterator<Item = Lenient<RawEventRecord>>,
{
    let mut normalized = NormalizedEvents::default();
    for record in records {
        match record.parsed().and_then(normalize_event) {
            Some(event) => normalized.events.push(event),
            None => normalized.skipped += 1,
        }
    }
    if normalized.skipped > 0 {
        tracing::warn!(
            skipped = normalized.skipped,
            kept = normalized.events.len(),
            "Skipped malformed event records"
        );
    }
    normalized
}

/// Convert one wire event; `None` without an event type or creation time
pub fn normalize_event(raw: RawEventRecord) -> Option<EventRecord> {
    let event_type = raw
        .event_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;
    let created_at: DateTime<Utc> = raw.created_at.as_ref().and_then(parse_timestamp_value)?;

    Some(EventRecord {
        id: raw.id.as_ref().map(lenient_id).unwrap_or(0),
        event_type,
        user_id: raw.user_id.as_ref().map(user_id_string).unwrap_or_default(),
        page_url: string_field(raw.page_url),
        user_agent: string_field(raw.user_agent).unwrap_or_default(),
        ip_address: string_field(raw.ip_address).filter(|ip| !ip.trim().is_empty()),
        event_data: raw.event_data.map(event_data_map).unwrap_or_default(),
        created_at,
    })
}

pub fn normalize_endpoints<I>(records: I) -> NormalizedEndpoints
where
    I: IntoIterator<Item = Lenient<RawEndpointMetric>>,
{
    let mut normalized = NormalizedEndpoints::default();
    for record in records {
        match record.parsed() {
            Some(raw) => normalized.metrics.push(normalize_endpoint(raw)),
            None => normalized.skipped += 1,
        }
    }
    if normalized.skipped > 0 {
        tracing::warn!(
            skipped = normalized.skipped,
            "Skipped endpoint records with an unexpected shape"
        );
    }
    normalized
}

/// Convert one wire endpoint record, coercing counts to integers.
///
/// A missing endpoint becomes an empty string, which the merger rejects.
pub fn normalize_endpoint(raw: RawEndpointMetric) -> EndpointMetric {
    let mut metric = EndpointMetric::new(raw.endpoint.unwrap_or_default().trim());
    metric.status_codes = coerce_counts(raw.status_codes);
    metric.hourly_pattern = coerce_counts(raw.hourly_pattern);
    metric.daily_pattern = coerce_counts(raw.daily_pattern);
    metric.response_times = raw
        .response_times
        .unwrap_or_default()
        .iter()
        .filter_map(response_time_sample)
        .collect();
    metric.requests_per_minute = raw
        .requests_per_minute
        .as_ref()
        .map(lenient_f64)
        .unwrap_or(0.0)
        .max(0.0);
    metric.average_response_time = raw
        .average_response_time
        .as_ref()
        .filter(|value| !value.is_null())
        .map(lenient_f64);
    metric
}

fn coerce_counts(
    counts: Option<indexmap::IndexMap<String, JsonValue>>,
) -> indexmap::IndexMap<String, u64> {
    counts
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, lenient_u64(&value)))
        .collect()
}

/// A sample is a bare number or `{value|responseTime|duration, timestamp}`
fn response_time_sample(value: &JsonValue) -> Option<ResponseTimeSample> {
    match value {
        JsonValue::Number(_) | JsonValue::String(_) => Some(ResponseTimeSample {
            value: lenient_f64(value),
            timestamp: None,
        }),
        JsonValue::Object(map) => {
            let sample = ["value", "responseTime", "response_time", "duration"]
                .iter()
                .find_map(|key| map.get(*key))?;
            Some(ResponseTimeSample {
                value: lenient_f64(sample),
                timestamp: map
                    .get("timestamp")
                    .or_else(|| map.get("time"))
                    .and_then(parse_timestamp_value),
            })
        }
        _ => None,
    }
}

fn lenient_id(value: &JsonValue) -> i64 {
    match value {
        JsonValue::Number(n) => n.as_i64().unwrap_or(0),
        JsonValue::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn user_id_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Non-string values of optional string fields are dropped
fn string_field(value: Option<JsonValue>) -> Option<String> {
    match value {
        Some(JsonValue::String(s)) => Some(s),
        _ => None,
    }
}

/// Payload as a map; a JSON-encoded object string is decoded first
fn event_data_map(value: EventValue) -> EventData {
    match value {
        EventValue::Object(map) => map,
        EventValue::String(encoded) => match serde_json::from_str::<EventValue>(&encoded) {
            Ok(EventValue::Object(map)) => map,
            _ => EventData::new(),
        },
        _ => EventData::new(),
    }
}
