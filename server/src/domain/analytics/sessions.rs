//! Session segmentation
//!
//! A user's events are split into sessions wherever two adjacent events are
//! more than [`SESSION_IDLE_GAP_MS`] apart. A gap of exactly the threshold
//! stays in the same session.

use indexmap::IndexMap;

use super::types::{EventRecord, Session};

/// Idle gap after which a new session starts (5 minutes)
pub const SESSION_IDLE_GAP_MS: i64 = 5 * 60 * 1000;

/// Grouping key for events without a user id
pub const ANONYMOUS_USER: &str = "anonymous";

/// Split one user's events into chronologically ordered sessions.
///
/// Input order does not matter; events are stably sorted by `created_at`.
pub fn segment_user_events(user_id: &str, mut events: Vec<EventRecord>) -> Vec<Session> {
    events.sort_by_key(|event| event.created_at);

    let mut sessions = Vec::new();
    let mut current: Vec<EventRecord> = Vec::new();

    for event in events {
        if let Some(prev) = current.last() {
            let gap_ms = (event.created_at - prev.created_at).num_milliseconds();
            if gap_ms > SESSION_IDLE_GAP_MS {
                sessions.extend(Session::from_events(user_id, std::mem::take(&mut current)));
            }
        }
        current.push(event);
    }
    sessions.extend(Session::from_events(user_id, current));

    sessions
}

/// Group events by user id in first-seen order
pub fn group_by_user(events: Vec<EventRecord>) -> IndexMap<String, Vec<EventRecord>> {
    let mut groups: IndexMap<String, Vec<EventRecord>> = IndexMap::new();
    for event in events {
        let key = if event.user_id.trim().is_empty() {
            ANONYMOUS_USER.to_string()
        } else {
            event.user_id.clone()
        };
        groups.entry(key).or_default().push(event);
    }
    groups
}

/// Segment a mixed batch: users in first-seen order, each user's sessions chronological
pub fn segment_all(events: Vec<EventRecord>) -> Vec<Session> {
    let groups = group_by_user(events);
    tracing::trace!(users = groups.len(), "Segmenting sessions");
    groups
        .into_iter()
        .flat_map(|(user_id, events)| segment_user_events(&user_id, events))
        .collect()
}
