//! Feed error type
//!
//! Errors raised while fetching the event and endpoint analytics feeds.
//! Callers that must never fail use the `*_or_empty` wrappers in
//! [`super::feeds`], which log these and substitute an empty page.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    /// Feed URL not configured
    #[error("{0} feed URL is not configured")]
    NotConfigured(&'static str),

    /// Connection, timeout or body read failure
    #[error("Feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("Feed returned HTTP {status}")]
    Status { status: u16 },

    /// Body was not the expected JSON shape
    #[error("Feed returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FeedError {
    /// Whether retrying the request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status } => *status >= 500 || *status == 429,
            Self::NotConfigured(_) | Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = FeedError::Status { status: 503 };
        assert_eq!(err.to_string(), "Feed returned HTTP 503");
    }

    #[test]
    fn test_not_configured_display() {
        let err = FeedError::NotConfigured("Events");
        assert_eq!(err.to_string(), "Events feed URL is not configured");
    }

    #[test]
    fn test_is_transient() {
        assert!(FeedError::Status { status: 502 }.is_transient());
        assert!(FeedError::Status { status: 429 }.is_transient());
        assert!(!FeedError::Status { status: 404 }.is_transient());
        assert!(!FeedError::NotConfigured("Endpoints").is_transient());

        let decode = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(!FeedError::Decode(decode).is_transient());
    }
}
