//! Endpoint metrics merging
//!
//! Collector shards report the same endpoint several times. Records are
//! folded into one accumulator per endpoint URL, in first-seen order.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::normalize::normalize_endpoints;
use super::types::EndpointMetric;
use crate::data::types::EndpointAnalyticsPage;
use crate::utils::time::parse_timestamp_value;

/// Result of merging one batch of endpoint records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedEndpoints {
    pub endpoints: Vec<EndpointMetric>,
    /// Records dropped for lacking an endpoint URL
    pub skipped: usize,
}

/// Merge records sharing an endpoint URL.
///
/// Status codes and hourly/daily buckets are summed per key, response-time
/// samples are appended, and requests-per-minute keeps the maximum. The
/// first record's average response time is kept as reported.
pub fn merge_endpoint_metrics<I>(records: I) -> MergedEndpoints
where
    I: IntoIterator<Item = EndpointMetric>,
{
    let mut merged: IndexMap<String, EndpointMetric> = IndexMap::new();
    let mut skipped = 0;

    for mut record in records {
        let key = record.endpoint.trim();
        if key.is_empty() {
            skipped += 1;
            continue;
        }
        let key = key.to_string();

        match merged.get_mut(&key) {
            Some(existing) => merge_into(existing, record),
            None => {
                record.endpoint = key.clone();
                record.occurrences = 1;
                merged.insert(key, record);
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped endpoint records without an endpoint URL");
    }
    tracing::trace!(endpoints = merged.len(), "Merged endpoint metrics");

    MergedEndpoints {
        endpoints: merged.into_values().collect(),
        skipped,
    }
}

fn merge_into(existing: &mut EndpointMetric, incoming: EndpointMetric) {
    existing.occurrences = existing.occurrences.saturating_add(1);
    add_counts(&mut existing.status_codes, incoming.status_codes);
    existing.response_times.extend(incoming.response_times);
    existing.requests_per_minute = existing
        .requests_per_minute
        .max(incoming.requests_per_minute);
    add_counts(&mut existing.hourly_pattern, incoming.hourly_pattern);
    add_counts(&mut existing.daily_pattern, incoming.daily_pattern);
}

fn add_counts(into: &mut IndexMap<String, u64>, from: IndexMap<String, u64>) {
    for (key, count) in from {
        let slot = into.entry(key).or_insert(0);
        *slot = slot.saturating_add(count);
    }
}

/// Merged view of one endpoint analytics payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReport {
    pub generated_at: DateTime<Utc>,
    /// Timestamp reported by the feed, if it sent a readable one
    pub feed_timestamp: Option<DateTime<Utc>>,
    pub endpoints: Vec<EndpointMetric>,
    pub skipped_records: usize,
}

impl EndpointReport {
    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            feed_timestamp: None,
            endpoints: Vec::new(),
            skipped_records: 0,
        }
    }
}

/// Normalise and merge a feed payload. Both malformed records and records
/// without an endpoint URL count as skipped.
pub fn build_endpoint_report(
    page: EndpointAnalyticsPage,
    generated_at: DateTime<Utc>,
) -> EndpointReport {
    let feed_timestamp = page.timestamp.as_ref().and_then(parse_timestamp_value);
    let normalized = normalize_endpoints(page.endpoints);
    let merged = merge_endpoint_metrics(normalized.metrics);

    EndpointReport {
        generated_at,
        feed_timestamp,
        endpoints: merged.endpoints,
        skipped_records: normalized.skipped + merged.skipped,
    }
}
