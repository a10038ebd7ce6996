//! Request types for the analytics endpoints

use serde::Deserialize;
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::api::types::validate_batch_size;
use crate::core::constants::MAX_TOP_PATHS;
use crate::data::types::{EndpointAnalyticsPage, Lenient, RawEndpointMetric, RawEventRecord};

#[derive(Debug, Deserialize, Validate)]
pub struct SnapshotQuery {
    /// `hour`, `day`, `week` or `all`; anything else means `all`
    #[validate(length(max = 16))]
    pub timeframe: Option<String>,
    #[validate(length(max = 64))]
    pub timezone: Option<String>,
}

/// Event batch to aggregate, in the same record shape the event feed uses
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    #[serde(default, alias = "records")]
    #[validate(custom(function = "validate_batch_size"))]
    pub events: Vec<Lenient<RawEventRecord>>,
    #[validate(length(max = 16))]
    pub timeframe: Option<String>,
    #[validate(length(max = 64))]
    pub timezone: Option<String>,
    #[validate(range(min = 1, max = MAX_TOP_PATHS))]
    pub top_paths: Option<usize>,
    /// Reference instant for the time window (RFC 3339); defaults to now
    pub now: Option<String>,
}

/// Endpoint batch to merge, shaped like the endpoint analytics feed
#[derive(Debug, Deserialize, Validate)]
pub struct MergeRequest {
    pub timestamp: Option<JsonValue>,
    #[serde(default)]
    #[validate(custom(function = "validate_batch_size"))]
    pub endpoints: Vec<Lenient<RawEndpointMetric>>,
}

impl From<MergeRequest> for EndpointAnalyticsPage {
    fn from(req: MergeRequest) -> Self {
        Self {
            timestamp: req.timestamp,
            endpoints: req.endpoints,
        }
    }
}
