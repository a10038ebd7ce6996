//! Feed wire types
//!
//! Feeds are produced by loosely typed collectors: every field is optional,
//! both `camelCase` and `snake_case` keys are accepted, and a record that
//! does not even have the right shape is kept as [`Lenient::Invalid`] so one
//! bad record never fails the whole page.

mod endpoints;
mod events;

pub use endpoints::{EndpointAnalyticsPage, RawEndpointMetric};
pub use events::{EventPage, EventQuery, RawEventRecord};

use serde::{Deserialize, Serialize};

/// A record that either matched its wire shape or is kept raw for counting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Parsed(T),
    Invalid(serde_json::Value),
}

impl<T> Lenient<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}
