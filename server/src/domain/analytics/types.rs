//! Analytics domain types
//!
//! `EventRecord` is the immutable source of truth; every other type here is
//! derived from a batch of events (or endpoint records) per request.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// EVENT PAYLOAD
// ============================================================================

/// A single value in an event's `eventData` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<EventValue>),
    Object(IndexMap<String, EventValue>),
}

impl EventValue {
    /// String content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content; numeric strings are accepted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Self::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Null | Self::Bool(_) | Self::List(_) | Self::Object(_) => None,
        }
    }

    /// Nested object, if this is an object
    pub fn as_object(&self) -> Option<&EventData> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for EventValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for EventValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for EventValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for EventValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Event payload keyed by field name, in payload order
pub type EventData = IndexMap<String, EventValue>;

// ============================================================================
// EVENT RECORD
// ============================================================================

/// One user-interaction event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub user_id: String,
    pub page_url: Option<String>,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub event_data: EventData,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(
        id: i64,
        event_type: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            user_id: user_id.into(),
            page_url: None,
            user_agent: String::new(),
            ip_address: None,
            event_data: EventData::new(),
            created_at,
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<EventValue>) -> Self {
        self.event_data.insert(key.into(), value.into());
        self
    }

    /// Page URL when present and non-blank
    pub fn page(&self) -> Option<&str> {
        self.page_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Top-level payload value by key
    pub fn data(&self, key: &str) -> Option<&EventValue> {
        self.event_data.get(key)
    }
}

// ============================================================================
// SESSIONS & JOURNEYS
// ============================================================================

/// A maximal run of one user's events with no internal gap above the idle threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub events: Vec<EventRecord>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl Session {
    /// Build a session from chronologically ordered events; `None` when empty
    pub fn from_events(user_id: impl Into<String>, events: Vec<EventRecord>) -> Option<Self> {
        let start_time = events.first()?.created_at;
        let end_time = events.last()?.created_at;
        Some(Self {
            user_id: user_id.into(),
            duration_seconds: span_seconds(start_time, end_time),
            events,
            start_time,
            end_time,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Ordered event-type sequence of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJourney {
    pub user_id: String,
    pub journey: Vec<String>,
    pub events: Vec<EventRecord>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

/// A canonical (noise-filtered) journey path and how many journeys share it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPath {
    pub path: String,
    pub count: u64,
}

/// Whole seconds between two instants (0 when `end` precedes `start`)
pub(crate) fn span_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    ((end - start).num_milliseconds() / 1000).max(0)
}

// ============================================================================
// DISTRIBUTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeCount {
    pub event_type: String,
    pub count: u64,
}

/// Events per local wall-clock minute (`HH:MM`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub time: String,
    pub minute_of_day: u16,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewCount {
    pub page_url: String,
    pub count: u64,
}

/// Add-to-cart interactions per product; price and category are first-seen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInteraction {
    pub product_name: String,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub count: u64,
}

// ============================================================================
// ENDPOINT METRICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeSample {
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Per-endpoint performance accumulator, keyed by endpoint URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetric {
    pub endpoint: String,
    pub status_codes: IndexMap<String, u64>,
    pub response_times: Vec<ResponseTimeSample>,
    pub hourly_pattern: IndexMap<String, u64>,
    pub daily_pattern: IndexMap<String, u64>,
    pub requests_per_minute: f64,
    /// As reported by the first record seen; merging never recomputes it
    pub average_response_time: Option<f64>,
    pub occurrences: u32,
}

impl EndpointMetric {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status_codes: IndexMap::new(),
            response_times: Vec::new(),
            hourly_pattern: IndexMap::new(),
            daily_pattern: IndexMap::new(),
            requests_per_minute: 0.0,
            average_response_time: None,
            occurrences: 1,
        }
    }

    /// Total requests across all status codes
    pub fn total_requests(&self) -> u64 {
        self.status_codes.values().sum()
    }
}
