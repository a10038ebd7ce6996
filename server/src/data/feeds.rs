//! Feed clients
//!
//! [`FeedSource`] is the seam between the analytics service and wherever
//! raw batches come from. [`HttpFeedClient`] fetches them over HTTP with a
//! per-request timeout and bounded retries on transient failures.

use std::time::Duration;

use async_trait::async_trait;

use super::error::FeedError;
use super::types::{EndpointAnalyticsPage, EventPage, EventQuery};
use crate::core::config::FeedsConfig;
use crate::core::constants::{APP_NAME, FEED_RETRY_BASE_DELAY_MS};
use crate::utils::retry::retry_with_backoff_async_if;

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, FeedError>;

    async fn fetch_endpoint_analytics(&self) -> Result<EndpointAnalyticsPage, FeedError>;
}

/// Fetch events, substituting an empty page on any failure
pub async fn fetch_events_or_empty(source: &dyn FeedSource, query: &EventQuery) -> EventPage {
    match source.fetch_events(query).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(error = %e, timeframe = %query.timeframe, "Event feed unavailable");
            EventPage::empty()
        }
    }
}

/// Fetch endpoint analytics, substituting an empty page on any failure
pub async fn fetch_endpoint_analytics_or_empty(source: &dyn FeedSource) -> EndpointAnalyticsPage {
    match source.fetch_endpoint_analytics().await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(error = %e, "Endpoint analytics feed unavailable");
            EndpointAnalyticsPage::empty()
        }
    }
}

/// HTTP implementation of [`FeedSource`]
pub struct HttpFeedClient {
    client: reqwest::Client,
    events_url: Option<String>,
    endpoints_url: Option<String>,
    max_attempts: u32,
    retry_delay_ms: u64,
}

impl HttpFeedClient {
    pub fn new(config: &FeedsConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("{}/{}", APP_NAME, CURRENT_VERSION))
            .build()?;

        Ok(Self {
            client,
            events_url: config.events_url.clone(),
            endpoints_url: config.endpoints_url.clone(),
            max_attempts: config.retries.max(1),
            retry_delay_ms: FEED_RETRY_BASE_DELAY_MS,
        })
    }

    #[cfg(test)]
    fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// GET `url` with retries; the body is decoded by the caller, once
    async fn get_body(&self, url: &str, query: &[(&str, String)]) -> Result<String, FeedError> {
        let result = retry_with_backoff_async_if(
            self.max_attempts,
            self.retry_delay_ms,
            move || self.get_once(url, query),
            FeedError::is_transient,
        )
        .await;

        match result {
            Ok((body, attempts)) => {
                tracing::trace!(url, attempts, bytes = body.len(), "Feed fetched");
                Ok(body)
            }
            Err((e, attempts)) => {
                tracing::debug!(url, attempts, error = %e, "Feed fetch failed");
                Err(e)
            }
        }
    }

    async fn get_once(&self, url: &str, query: &[(&str, String)]) -> Result<String, FeedError> {
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, FeedError> {
        let url = self
            .events_url
            .as_deref()
            .ok_or(FeedError::NotConfigured("Events"))?;
        let params = [
            ("timeframe", query.timeframe.to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        let body = self.get_body(url, &params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_endpoint_analytics(&self) -> Result<EndpointAnalyticsPage, FeedError> {
        let url = self
            .endpoints_url
            .as_deref()
            .ok_or(FeedError::NotConfigured("Endpoints"))?;
        let body = self.get_body(url, &[]).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analytics::Timeframe;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer, retries: u32) -> HttpFeedClient {
        let config = FeedsConfig {
            events_url: Some(server.url("/events")),
            endpoints_url: Some(server.url("/endpoints")),
            timeout_secs: 5,
            retries,
            page_limit: 100,
        };
        HttpFeedClient::new(&config).unwrap().with_retry_delay_ms(1)
    }

    #[tokio::test]
    async fn test_fetch_events_sends_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/events")
                    .query_param("timeframe", "day")
                    .query_param("limit", "100")
                    .query_param("offset", "0");
                then.status(200).json_body(json!({
                    "records": [{"eventType": "click", "createdAt": "2024-01-01T00:00:00Z"}],
                    "totalRecords": 1,
                    "limit": 100,
                    "offset": 0
                }));
            })
            .await;

        let page = client(&server, 1)
            .fetch_events(&EventQuery::new(Timeframe::Day, 100))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total_records, 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/endpoints");
                then.status(503);
            })
            .await;

        let err = client(&server, 3)
            .fetch_endpoint_analytics()
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Status { status: 503 }));
        mock.assert_calls_async(3).await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/endpoints");
                then.status(404);
            })
            .await;

        let err = client(&server, 3)
            .fetch_endpoint_analytics()
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Status { status: 404 }));
        mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_non_json_degrades_to_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/endpoints");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let client = client(&server, 2);
        assert!(matches!(
            client.fetch_endpoint_analytics().await,
            Err(FeedError::Decode(_))
        ));
        let page = fetch_endpoint_analytics_or_empty(&client).await;
        assert_eq!(page, EndpointAnalyticsPage::empty());
    }

    #[tokio::test]
    async fn test_unreachable_feed_degrades_to_empty() {
        let config = FeedsConfig {
            events_url: Some("http://127.0.0.1:1/events".to_string()),
            retries: 1,
            ..Default::default()
        };
        let client = HttpFeedClient::new(&config).unwrap();

        let page = fetch_events_or_empty(&client, &EventQuery::new(Timeframe::All, 10)).await;
        assert_eq!(page, EventPage::empty());
    }

    #[tokio::test]
    async fn test_unconfigured_feed() {
        let client = HttpFeedClient::new(&FeedsConfig::default()).unwrap();
        let err = client
            .fetch_events(&EventQuery::new(Timeframe::All, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::NotConfigured("Events")));
    }
}
