//! Time window filtering

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::types::EventRecord;

/// Relative look-back window ending at "now"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    #[default]
    All,
}

impl Timeframe {
    /// Parse a timeframe token. Unrecognized tokens mean no cutoff.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            _ => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::All => "all",
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Hour => Some(Duration::hours(1)),
            Self::Day => Some(Duration::hours(24)),
            Self::Week => Some(Duration::days(7)),
            Self::All => None,
        }
    }

    /// Absolute cutoff instant for `now`; `None` keeps everything
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| now - d)
    }
}

impl From<String> for Timeframe {
    fn from(token: String) -> Self {
        Self::parse(&token)
    }
}

impl From<&str> for Timeframe {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep events with `created_at >= cutoff`, preserving input order
pub fn filter_by_window(
    events: Vec<EventRecord>,
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> Vec<EventRecord> {
    match timeframe.cutoff(now) {
        Some(cutoff) => events
            .into_iter()
            .filter(|event| event.created_at >= cutoff)
            .collect(),
        None => events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn event_at(id: i64, at: DateTime<Utc>) -> EventRecord {
        EventRecord::new(id, "click", "u1", at)
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(Timeframe::parse("hour"), Timeframe::Hour);
        assert_eq!(Timeframe::parse(" Day "), Timeframe::Day);
        assert_eq!(Timeframe::parse("WEEK"), Timeframe::Week);
        assert_eq!(Timeframe::parse("all"), Timeframe::All);
        assert_eq!(Timeframe::parse("fortnight"), Timeframe::All);
        assert_eq!(Timeframe::parse(""), Timeframe::All);
    }

    #[test]
    fn test_cutoff() {
        let now = now();
        assert_eq!(Timeframe::Hour.cutoff(now), Some(now - Duration::hours(1)));
        assert_eq!(Timeframe::Day.cutoff(now), Some(now - Duration::hours(24)));
        assert_eq!(Timeframe::Week.cutoff(now), Some(now - Duration::days(7)));
        assert_eq!(Timeframe::All.cutoff(now), None);
    }

    #[test]
    fn test_filter_keeps_cutoff_boundary() {
        let now = now();
        let events = vec![
            event_at(1, now - Duration::hours(2)),
            event_at(2, now - Duration::hours(1)),
            event_at(3, now - Duration::minutes(5)),
        ];
        let kept = filter_by_window(events, Timeframe::Hour, now);
        let ids: Vec<i64> = kept.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_filter_all_keeps_everything() {
        let now = now();
        let events = vec![
            event_at(1, now - Duration::days(400)),
            event_at(2, now),
        ];
        assert_eq!(filter_by_window(events, Timeframe::All, now).len(), 2);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Timeframe::Week).unwrap(), "\"week\"");
        let parsed: Timeframe = serde_json::from_str("\"HOUR\"").unwrap();
        assert_eq!(parsed, Timeframe::Hour);
        let parsed: Timeframe = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(parsed, Timeframe::All);
    }
}
