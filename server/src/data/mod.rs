//! Feed access layer
//!
//! - `types` - Wire shapes of the event and endpoint analytics feeds
//! - `feeds` - `FeedSource` trait and its HTTP client
//! - `error` - Feed error type

pub mod error;
pub mod feeds;
pub mod types;

pub use error::FeedError;
pub use feeds::{
    FeedSource, HttpFeedClient, fetch_endpoint_analytics_or_empty, fetch_events_or_empty,
};
