//! Analytics snapshot assembly
//!
//! One call turns a raw event batch into a complete snapshot. Every
//! collection is always present; an empty batch yields empty collections
//! and zeroed counters.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::distribution::{event_type_counts, page_view_counts, product_interactions, timeline};
use super::journeys::{DEFAULT_TOP_PATHS, extract_journeys, rank_journey_paths};
use super::normalize::normalize_events;
use super::sessions::segment_all;
use super::types::{
    EventRecord, EventTypeCount, JourneyPath, PageViewCount, ProductInteraction, Session,
    TimelineBucket, UserJourney,
};
use super::window::{Timeframe, filter_by_window};
use crate::data::types::{Lenient, RawEventRecord};

/// Parameters for one snapshot computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOptions {
    pub timeframe: Timeframe,
    pub now: DateTime<Utc>,
    /// Zone used for the `HH:MM` timeline buckets
    pub timezone: Tz,
    pub top_paths: usize,
}

impl SnapshotOptions {
    pub fn new(timeframe: Timeframe, now: DateTime<Utc>) -> Self {
        Self {
            timeframe,
            now,
            timezone: Tz::UTC,
            top_paths: DEFAULT_TOP_PATHS,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_top_paths(mut self, top_paths: usize) -> Self {
        self.top_paths = top_paths;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub total_events: usize,
    pub unique_users: usize,
    pub total_sessions: usize,
    pub average_session_duration_secs: f64,
    /// Records dropped during normalisation
    pub skipped_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub timezone: String,
    pub events: Vec<EventRecord>,
    pub sessions: Vec<Session>,
    pub journeys: Vec<UserJourney>,
    pub event_type_counts: Vec<EventTypeCount>,
    pub timeline: Vec<TimelineBucket>,
    pub page_view_counts: Vec<PageViewCount>,
    pub product_interactions: Vec<ProductInteraction>,
    /// Journeys made only of visibility events have an empty path and are not ranked
    pub top_journey_paths: Vec<JourneyPath>,
    pub summary: SnapshotSummary,
}

impl AnalyticsSnapshot {
    /// Snapshot with no data, as served before the first successful poll
    pub fn empty(options: &SnapshotOptions) -> Self {
        Self {
            generated_at: options.now,
            timeframe: options.timeframe,
            timezone: options.timezone.name().to_string(),
            events: Vec::new(),
            sessions: Vec::new(),
            journeys: Vec::new(),
            event_type_counts: Vec::new(),
            timeline: Vec::new(),
            page_view_counts: Vec::new(),
            product_interactions: Vec::new(),
            top_journey_paths: Vec::new(),
            summary: SnapshotSummary::default(),
        }
    }
}

/// Keep the first occurrence of each event id. Id 0 means "no id" and is never collapsed.
pub fn deduplicate_events(events: Vec<EventRecord>) -> Vec<EventRecord> {
    let mut seen = FxHashSet::default();
    let before = events.len();
    let deduped: Vec<EventRecord> = events
        .into_iter()
        .filter(|event| event.id == 0 || seen.insert(event.id))
        .collect();

    if deduped.len() < before {
        tracing::debug!(
            duplicates = before - deduped.len(),
            "Dropped duplicate event records"
        );
    }
    deduped
}

/// Compute a snapshot from validated events
pub fn build_snapshot(events: Vec<EventRecord>, options: &SnapshotOptions) -> AnalyticsSnapshot {
    let mut events = deduplicate_events(filter_by_window(events, options.timeframe, options.now));
    events.sort_by_key(|event| event.created_at);

    let sessions = segment_all(events.clone());
    let journeys = extract_journeys(&sessions);
    let top_journey_paths = rank_journey_paths(&journeys, options.top_paths);

    let unique_users = sessions
        .iter()
        .map(|session| session.user_id.as_str())
        .collect::<FxHashSet<_>>()
        .len();
    let average_session_duration_secs = if sessions.is_empty() {
        0.0
    } else {
        let total: i64 = sessions.iter().map(|s| s.duration_seconds).sum();
        total as f64 / sessions.len() as f64
    };

    let summary = SnapshotSummary {
        total_events: events.len(),
        unique_users,
        total_sessions: sessions.len(),
        average_session_duration_secs,
        skipped_records: 0,
    };

    tracing::trace!(
        timeframe = %options.timeframe,
        events = summary.total_events,
        sessions = summary.total_sessions,
        "Built analytics snapshot"
    );

    AnalyticsSnapshot {
        generated_at: options.now,
        timeframe: options.timeframe,
        timezone: options.timezone.name().to_string(),
        event_type_counts: event_type_counts(&events),
        timeline: timeline(&events, options.timezone),
        page_view_counts: page_view_counts(&events),
        product_interactions: product_interactions(&events),
        top_journey_paths,
        summary,
        events,
        sessions,
        journeys,
    }
}

/// Normalise wire records and compute a snapshot, reporting skipped records
pub fn build_snapshot_from_raw<I>(records: I, options: &SnapshotOptions) -> AnalyticsSnapshot
where
    I: IntoIterator<Item = Lenient<RawEventRecord>>,
{
    let normalized = normalize_events(records);
    let mut snapshot = build_snapshot(normalized.events, options);
    snapshot.summary.skipped_records = normalized.skipped;
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn options() -> SnapshotOptions {
        SnapshotOptions::new(Timeframe::All, now())
    }

    #[test]
    fn test_empty_batch_is_fully_populated() {
        let snapshot = build_snapshot(Vec::new(), &options());
        assert_eq!(snapshot, AnalyticsSnapshot::empty(&options()));

        let json = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "events",
            "sessions",
            "journeys",
            "eventTypeCounts",
            "timeline",
            "pageViewCounts",
            "productInteractions",
            "topJourneyPaths",
        ] {
            assert_eq!(json[key], json!([]), "{key} should be an empty array");
        }
        assert_eq!(json["summary"]["totalEvents"], json!(0));
        assert_eq!(json["timeframe"], json!("all"));
    }

    #[test]
    fn test_deduplicate_first_occurrence_wins() {
        let t = now();
        let events = vec![
            EventRecord::new(1, "click", "u1", t),
            EventRecord::new(1, "page_view", "u1", t),
            EventRecord::new(0, "scroll", "u1", t),
            EventRecord::new(0, "scroll", "u1", t),
            EventRecord::new(2, "click", "u2", t),
        ];
        let deduped = deduplicate_events(events);
        let kinds: Vec<&str> = deduped.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["click", "scroll", "scroll", "click"]);
    }

    #[test]
    fn test_build_snapshot_end_to_end() {
        let base = now() - Duration::minutes(30);
        let events = vec![
            EventRecord::new(1, "page_view", "u1", base).with_page_url("/home"),
            EventRecord::new(2, "click", "u1", base + Duration::minutes(2)),
            EventRecord::new(3, "page_view", "u1", base + Duration::minutes(10))
                .with_page_url("/home"),
            EventRecord::new(4, "page_view", "u2", base).with_page_url("/shop"),
            EventRecord::new(4, "page_view", "u2", base).with_page_url("/shop"),
            EventRecord::new(5, "page_view", "u3", now() - Duration::days(3)),
        ];

        let snapshot = build_snapshot(events, &SnapshotOptions::new(Timeframe::Day, now()));

        assert_eq!(snapshot.summary.total_events, 4);
        assert_eq!(snapshot.summary.unique_users, 2);
        assert_eq!(snapshot.summary.total_sessions, 3);
        assert_eq!(snapshot.summary.average_session_duration_secs, 40.0);
        assert_eq!(snapshot.page_view_counts[0].page_url, "/home");
        assert_eq!(snapshot.page_view_counts[0].count, 2);
        assert_eq!(snapshot.top_journey_paths[0].path, "page_view");
        assert_eq!(snapshot.top_journey_paths[0].count, 2);
        assert_eq!(snapshot.top_journey_paths[1].path, "page_view → click");
    }

    #[test]
    fn test_build_snapshot_from_raw_counts_skipped() {
        let records: Vec<Lenient<RawEventRecord>> = serde_json::from_value(json!([
            {"id": 1, "eventType": "page_view", "userId": "u1", "createdAt": "2024-06-01T11:00:00Z"},
            {"id": 2, "userId": "u1", "createdAt": "2024-06-01T11:01:00Z"},
            "broken"
        ]))
        .unwrap();

        let snapshot = build_snapshot_from_raw(records, &options().with_top_paths(1));
        assert_eq!(snapshot.summary.total_events, 1);
        assert_eq!(snapshot.summary.skipped_records, 2);
        assert_eq!(snapshot.top_journey_paths.len(), 1);
    }

    #[test]
    fn test_malformed_fields_never_fail_the_batch() {
        let records: Vec<Lenient<RawEventRecord>> = serde_json::from_value(json!([
            {"id": 1, "eventType": "click", "createdAt": i64::MIN},
            {"id": 2, "eventType": "click", "userId": "u1", "pageUrl": 5,
             "createdAt": "2024-06-01T11:00:00Z"},
            {"id": 3, "eventType": "page_view", "userId": "u1", "pageUrl": "/home",
             "createdAt": "2024-06-01T11:01:00Z"}
        ]))
        .unwrap();

        let snapshot = build_snapshot_from_raw(records, &options());
        assert_eq!(snapshot.summary.total_events, 2);
        assert_eq!(snapshot.summary.skipped_records, 1);
        assert_eq!(snapshot.event_type_counts.len(), 2);
        assert_eq!(snapshot.page_view_counts.len(), 1);
        assert_eq!(snapshot.page_view_counts[0].page_url, "/home");
    }

    #[test]
    fn test_noise_only_journeys_are_not_ranked() {
        let t = now();
        let events = vec![
            EventRecord::new(1, "visibility_hidden", "u1", t),
            EventRecord::new(2, "visibility_visible", "u1", t + Duration::seconds(5)),
        ];
        let snapshot = build_snapshot(events, &options());
        assert_eq!(snapshot.journeys.len(), 1);
        assert!(snapshot.top_journey_paths.is_empty());
    }

    #[test]
    fn test_timeline_respects_timezone_option() {
        let events = vec![EventRecord::new(1, "click", "u1", now())];
        let options = options().with_timezone(chrono_tz::Asia::Tokyo);
        let snapshot = build_snapshot(events, &options);
        assert_eq!(snapshot.timeline[0].time, "21:00");
        assert_eq!(snapshot.timezone, "Asia/Tokyo");
    }
}
