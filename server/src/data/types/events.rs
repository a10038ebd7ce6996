//! Event feed wire types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::Lenient;
use crate::domain::analytics::{EventValue, Timeframe};

/// Query sent to the event feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    pub timeframe: Timeframe,
    pub limit: u64,
    pub offset: u64,
}

impl EventQuery {
    pub fn new(timeframe: Timeframe, limit: u64) -> Self {
        Self {
            timeframe,
            limit,
            offset: 0,
        }
    }
}

/// One page of the event feed: `{records, totalRecords, limit, offset}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPage {
    #[serde(alias = "events")]
    pub records: Vec<Lenient<RawEventRecord>>,
    #[serde(alias = "total_records")]
    pub total_records: u64,
    pub limit: u64,
    pub offset: u64,
}

impl EventPage {
    /// Page substituted when the feed cannot be read
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Event record as sent by the feed, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEventRecord {
    pub id: Option<JsonValue>,
    #[serde(alias = "event_type")]
    pub event_type: Option<String>,
    #[serde(alias = "user_id")]
    pub user_id: Option<JsonValue>,
    /// Optional string fields stay raw so a mistyped value only loses itself
    #[serde(alias = "page_url")]
    pub page_url: Option<JsonValue>,
    #[serde(alias = "user_agent")]
    pub user_agent: Option<JsonValue>,
    #[serde(alias = "ip_address")]
    pub ip_address: Option<JsonValue>,
    /// Object payload, or the same payload encoded as a JSON string
    #[serde(alias = "event_data")]
    pub event_data: Option<EventValue>,
    #[serde(alias = "created_at", alias = "timestamp")]
    pub created_at: Option<JsonValue>,
}
