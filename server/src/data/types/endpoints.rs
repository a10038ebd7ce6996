//! Endpoint analytics feed wire types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::Lenient;

/// Endpoint analytics feed payload: `{timestamp, endpoints}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndpointAnalyticsPage {
    pub timestamp: Option<JsonValue>,
    pub endpoints: Vec<Lenient<RawEndpointMetric>>,
}

impl EndpointAnalyticsPage {
    /// Page substituted when the feed cannot be read
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Per-endpoint record as sent by one collector shard.
///
/// Counts may arrive as numbers or numeric strings; they are coerced during
/// normalisation, with anything unparsable counting as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEndpointMetric {
    #[serde(alias = "url")]
    pub endpoint: Option<String>,
    #[serde(alias = "status_codes", alias = "statusCodeCounts")]
    pub status_codes: Option<IndexMap<String, JsonValue>>,
    #[serde(alias = "response_times", alias = "responseTimeSamples")]
    pub response_times: Option<Vec<JsonValue>>,
    #[serde(alias = "hourly_pattern", alias = "hourlyCounts")]
    pub hourly_pattern: Option<IndexMap<String, JsonValue>>,
    #[serde(alias = "daily_pattern", alias = "dailyCounts")]
    pub daily_pattern: Option<IndexMap<String, JsonValue>>,
    #[serde(alias = "requests_per_minute", alias = "currentRequestsPerMinute")]
    pub requests_per_minute: Option<JsonValue>,
    #[serde(alias = "average_response_time", alias = "avgResponseTime")]
    pub average_response_time: Option<JsonValue>,
}
