//! Clickstream analytics engine
//!
//! - `window` - timeframe tokens and cutoff filtering
//! - `sessions` - idle-gap session segmentation
//! - `journeys` - event-type paths and path ranking
//! - `distribution` - event type, timeline, page view and product histograms
//! - `endpoints` - per-endpoint metric merging
//! - `snapshot` - assembles all of the above
//! - `service` - polls the feeds and publishes the latest snapshot

pub mod counter;
pub mod distribution;
pub mod endpoints;
pub mod journeys;
pub mod normalize;
pub mod service;
pub mod sessions;
pub mod snapshot;
pub mod types;
pub mod window;

pub use endpoints::{EndpointReport, build_endpoint_report, merge_endpoint_metrics};
pub use service::{AnalyticsService, LatestSnapshot, RefreshStatus};
pub use snapshot::{AnalyticsSnapshot, SnapshotOptions, build_snapshot, build_snapshot_from_raw};
pub use types::{EndpointMetric, EventRecord, EventValue, JourneyPath, Session, UserJourney};
pub use window::Timeframe;
