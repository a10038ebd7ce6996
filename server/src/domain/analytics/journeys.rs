//! Journey extraction and path ranking

use super::counter::OrderedCounter;
use super::types::{JourneyPath, Session, UserJourney};

/// Event types dropped from a journey before it becomes a ranking key
pub const NOISE_EVENT_TYPES: &[&str] = &["visibility_hidden", "visibility_visible"];

pub const PATH_SEPARATOR: &str = " → ";

pub const DEFAULT_TOP_PATHS: usize = 5;

/// One journey per session; the full event-type sequence is kept for display
pub fn extract_journeys(sessions: &[Session]) -> Vec<UserJourney> {
    sessions
        .iter()
        .map(|session| UserJourney {
            user_id: session.user_id.clone(),
            journey: session
                .events
                .iter()
                .map(|event| event.event_type.clone())
                .collect(),
            events: session.events.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            duration_seconds: session.duration_seconds,
        })
        .collect()
}

/// Noise-filtered journey joined into its ranking key
pub fn canonical_path<S: AsRef<str>>(journey: &[S]) -> String {
    journey
        .iter()
        .map(AsRef::as_ref)
        .filter(|event_type| !NOISE_EVENT_TYPES.contains(event_type))
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Rank canonical paths of `journeys`, truncated to `top_n`
pub fn rank_journey_paths(journeys: &[UserJourney], top_n: usize) -> Vec<JourneyPath> {
    rank_paths(
        journeys.iter().map(|journey| canonical_path(&journey.journey)),
        top_n,
    )
}

/// Tally already-canonical path strings; empty paths are not ranked.
///
/// Descending by count, ties in first-seen order.
pub fn rank_paths<I>(paths: I, top_n: usize) -> Vec<JourneyPath>
where
    I: IntoIterator<Item = String>,
{
    let counter: OrderedCounter<String> =
        paths.into_iter().filter(|path| !path.is_empty()).collect();

    counter
        .into_ranked()
        .into_iter()
        .take(top_n)
        .map(|(path, count)| JourneyPath { path, count })
        .collect()
}
