//! Analytics service
//!
//! Holds the most recent snapshot computed from the feeds and refreshes it
//! on each scheduler tick. Readers get an `Arc` to an immutable value; a
//! refresh swaps the whole thing in one step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;
use serde::Serialize;

use super::endpoints::{EndpointReport, build_endpoint_report};
use super::snapshot::{AnalyticsSnapshot, SnapshotOptions, build_snapshot_from_raw};
use super::window::Timeframe;
use crate::core::clock::Clock;
use crate::core::config::AnalyticsConfig;
use crate::core::scheduler::PollScheduler;
use crate::data::feeds::{FeedSource, fetch_endpoint_analytics_or_empty, fetch_events_or_empty};
use crate::data::types::EventQuery;

/// Outcome of the most recent poll
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    /// True until the first fully successful poll, and after any failed one
    pub stale: bool,
    pub last_error: Option<String>,
    pub refresh_count: u64,
}

/// Everything the poller publishes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestSnapshot {
    pub snapshot: AnalyticsSnapshot,
    pub endpoints: EndpointReport,
    pub status: RefreshStatus,
}

pub struct AnalyticsService {
    feeds: Arc<dyn FeedSource>,
    clock: Arc<dyn Clock>,
    config: AnalyticsConfig,
    page_limit: u64,
    latest: RwLock<Arc<LatestSnapshot>>,
}

impl AnalyticsService {
    pub fn new(
        feeds: Arc<dyn FeedSource>,
        clock: Arc<dyn Clock>,
        config: AnalyticsConfig,
        page_limit: u64,
    ) -> Self {
        let now = clock.now();
        let options = options_from(&config, config.timeframe, config.timezone, now);
        let initial = LatestSnapshot {
            snapshot: AnalyticsSnapshot::empty(&options),
            endpoints: EndpointReport::empty(now),
            status: RefreshStatus {
                stale: true,
                ..Default::default()
            },
        };

        Self {
            feeds,
            clock,
            config,
            page_limit,
            latest: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Last published snapshot
    pub fn latest(&self) -> Arc<LatestSnapshot> {
        Arc::clone(&*self.latest.read())
    }

    /// Snapshot options for the configured defaults at `now`
    pub fn options(&self, timeframe: Timeframe, timezone: Tz) -> SnapshotOptions {
        options_from(&self.config, timeframe, timezone, self.clock.now())
    }

    /// Poll both feeds now
    pub async fn refresh(&self) -> Arc<LatestSnapshot> {
        self.refresh_at(self.clock.now()).await
    }

    /// Poll both feeds and publish the result as of `now`.
    ///
    /// A feed that fails leaves its part of the previous snapshot in place and
    /// marks the status stale.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Arc<LatestSnapshot> {
        let query = EventQuery::new(self.config.timeframe, self.page_limit);
        let (events, endpoints) = tokio::join!(
            self.feeds.fetch_events(&query),
            self.feeds.fetch_endpoint_analytics()
        );

        let previous = self.latest();
        let mut errors = Vec::new();

        let snapshot = match events {
            Ok(page) => {
                let config = &self.config;
                let options = options_from(config, config.timeframe, config.timezone, now);
                build_snapshot_from_raw(page.records, &options)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Event feed poll failed, keeping previous snapshot");
                errors.push(format!("events: {e}"));
                previous.snapshot.clone()
            }
        };

        let endpoints = match endpoints {
            Ok(page) => build_endpoint_report(page, now),
            Err(e) => {
                tracing::warn!(error = %e, "Endpoint feed poll failed, keeping previous metrics");
                errors.push(format!("endpoints: {e}"));
                previous.endpoints.clone()
            }
        };

        let ok = errors.is_empty();
        let status = RefreshStatus {
            last_success: if ok { Some(now) } else { previous.status.last_success },
            last_attempt: Some(now),
            stale: !ok,
            last_error: (!ok).then(|| errors.join("; ")),
            refresh_count: previous.status.refresh_count.saturating_add(1),
        };

        tracing::debug!(
            events = snapshot.summary.total_events,
            sessions = snapshot.summary.total_sessions,
            endpoints = endpoints.endpoints.len(),
            stale = status.stale,
            "Analytics refreshed"
        );

        let latest = Arc::new(LatestSnapshot {
            snapshot,
            endpoints,
            status,
        });
        *self.latest.write() = Arc::clone(&latest);
        latest
    }

    /// Fetch events and compute a snapshot on demand. An unreadable feed
    /// yields an empty snapshot.
    pub async fn snapshot_for(&self, timeframe: Timeframe, timezone: Tz) -> AnalyticsSnapshot {
        let options = self.options(timeframe, timezone);
        let query = EventQuery::new(timeframe, self.page_limit);
        let page = fetch_events_or_empty(self.feeds.as_ref(), &query).await;
        build_snapshot_from_raw(page.records, &options)
    }

    /// Fetch and merge endpoint analytics on demand
    pub async fn endpoint_report(&self) -> EndpointReport {
        let page = fetch_endpoint_analytics_or_empty(self.feeds.as_ref()).await;
        build_endpoint_report(page, self.now())
    }

    /// Drive [`refresh_at`](Self::refresh_at) from `scheduler`
    pub fn start_polling(self: &Arc<Self>, scheduler: &PollScheduler) -> bool {
        let service = Arc::clone(self);
        scheduler.start(move |at| {
            let service = Arc::clone(&service);
            async move {
                service.refresh_at(at).await;
            }
        })
    }
}

fn options_from(
    config: &AnalyticsConfig,
    timeframe: Timeframe,
    timezone: Tz,
    now: DateTime<Utc>,
) -> SnapshotOptions {
    SnapshotOptions::new(timeframe, now)
        .with_timezone(timezone)
        .with_top_paths(config.top_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::data::FeedError;
    use crate::data::types::{EndpointAnalyticsPage, EventPage};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct StubFeed {
        fail_events: AtomicBool,
        fail_endpoints: AtomicBool,
        event_calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedSource for StubFeed {
        async fn fetch_events(&self, _query: &EventQuery) -> Result<EventPage, FeedError> {
            self.event_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_events.load(Ordering::SeqCst) {
                return Err(FeedError::Status { status: 503 });
            }
            Ok(serde_json::from_value(json!({
                "records": [
                    {"id": 1, "eventType": "page_view", "userId": "u1",
                     "pageUrl": "/home", "createdAt": "2024-06-01T11:50:00Z"},
                    {"id": 2, "eventType": "click", "userId": "u1",
                     "createdAt": "2024-06-01T11:51:00Z"},
                    {"id": 2, "eventType": "click", "userId": "u1",
                     "createdAt": "2024-06-01T11:51:00Z"},
                    {"eventType": "", "createdAt": "2024-06-01T11:52:00Z"}
                ],
                "totalRecords": 4
            }))?)
        }

        async fn fetch_endpoint_analytics(&self) -> Result<EndpointAnalyticsPage, FeedError> {
            if self.fail_endpoints.load(Ordering::SeqCst) {
                return Err(FeedError::Status { status: 500 });
            }
            Ok(serde_json::from_value(json!({
                "timestamp": 1717243200000i64,
                "endpoints": [
                    {"endpoint": "/api/x", "statusCodes": {"200": 3}},
                    {"endpoint": "/api/x", "statusCodes": {"200": 2}}
                ]
            }))?)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn service(feed: Arc<StubFeed>) -> AnalyticsService {
        AnalyticsService::new(
            feed,
            Arc::new(ManualClock::new(now())),
            AnalyticsConfig::default(),
            100,
        )
    }

    #[test]
    fn test_initial_snapshot_is_empty_and_stale() {
        let service = service(Arc::new(StubFeed::default()));
        let latest = service.latest();
        assert!(latest.snapshot.events.is_empty());
        assert!(latest.endpoints.endpoints.is_empty());
        assert!(latest.status.stale);
        assert_eq!(latest.status.refresh_count, 0);
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let service = service(Arc::new(StubFeed::default()));
        service.refresh().await;

        let latest = service.latest();
        assert_eq!(latest.snapshot.summary.total_events, 2);
        assert_eq!(latest.snapshot.summary.skipped_records, 1);
        assert_eq!(latest.snapshot.sessions.len(), 1);
        assert_eq!(latest.endpoints.endpoints[0].status_codes["200"], 5);
        assert!(!latest.status.stale);
        assert_eq!(latest.status.last_success, Some(now()));
        assert_eq!(latest.status.refresh_count, 1);
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_previous_snapshot() {
        let feed = Arc::new(StubFeed::default());
        let service = service(feed.clone());
        service.refresh().await;

        feed.fail_events.store(true, Ordering::SeqCst);
        feed.fail_endpoints.store(true, Ordering::SeqCst);
        let later = now() + chrono::Duration::minutes(1);
        let latest = service.refresh_at(later).await;

        assert_eq!(latest.snapshot.summary.total_events, 2);
        assert_eq!(latest.endpoints.endpoints.len(), 1);
        assert!(latest.status.stale);
        assert_eq!(latest.status.last_success, Some(now()));
        assert_eq!(latest.status.last_attempt, Some(later));
        let error = latest.status.last_error.as_deref().unwrap();
        assert!(error.contains("events"));
        assert!(error.contains("endpoints"));
    }

    #[tokio::test]
    async fn test_partial_failure_updates_healthy_side() {
        let feed = Arc::new(StubFeed::default());
        feed.fail_endpoints.store(true, Ordering::SeqCst);
        let service = service(feed);

        let latest = service.refresh().await;
        assert_eq!(latest.snapshot.summary.total_events, 2);
        assert!(latest.endpoints.endpoints.is_empty());
        assert!(latest.status.stale);
        assert_eq!(latest.status.last_success, None);
    }

    #[tokio::test]
    async fn test_on_demand_snapshot_degrades_to_empty() {
        let feed = Arc::new(StubFeed::default());
        feed.fail_events.store(true, Ordering::SeqCst);
        let service = service(feed);

        let snapshot = service.snapshot_for(Timeframe::Hour, Tz::UTC).await;
        assert!(snapshot.events.is_empty());
        assert_eq!(snapshot.timeframe, Timeframe::Hour);
    }

    #[tokio::test]
    async fn test_on_demand_snapshot_uses_timezone() {
        let service = service(Arc::new(StubFeed::default()));
        let snapshot = service
            .snapshot_for(Timeframe::Hour, chrono_tz::Asia::Tokyo)
            .await;

        assert_eq!(snapshot.timezone, "Asia/Tokyo");
        let labels: Vec<&str> = snapshot.timeline.iter().map(|b| b.time.as_str()).collect();
        assert_eq!(labels, vec!["20:50", "20:51"]);
    }

    #[tokio::test]
    async fn test_endpoint_report_on_demand() {
        let service = service(Arc::new(StubFeed::default()));
        let report = service.endpoint_report().await;
        assert_eq!(report.endpoints.len(), 1);
        assert_eq!(report.endpoints[0].occurrences, 2);
        assert_eq!(report.feed_timestamp, Some(now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_refreshes_on_each_tick() {
        let feed = Arc::new(StubFeed::default());
        let service = Arc::new(service(feed.clone()));
        let clock = Arc::new(ManualClock::new(now()));
        let scheduler = PollScheduler::new(Duration::from_secs(30), clock);

        assert!(service.start_polling(&scheduler));
        tokio::time::sleep(Duration::from_secs(65)).await;
        scheduler.stop();

        assert_eq!(feed.event_calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.latest().status.refresh_count, 3);
    }
}
