//! Domain logic
//!
//! - `analytics` - clickstream sessions, journeys, distributions and endpoint metrics

pub mod analytics;

pub use analytics::{AnalyticsService, AnalyticsSnapshot, Timeframe};
