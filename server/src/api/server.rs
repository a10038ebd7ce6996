//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{analytics, health};
use crate::core::config::ServerConfig;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::core::shutdown::ShutdownService;
use crate::domain::analytics::AnalyticsService;

/// Build the full HTTP router
pub fn router(service: Arc<AnalyticsService>, server: &ServerConfig) -> Router {
    let allowed_origins = AllowedOrigins::new(&server.host, server.port);

    Router::new()
        .route("/", get(|| async { Redirect::temporary("/api/docs") }))
        .route("/api/v1/health", get(health::health))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .route("/api/docs/", get(swagger_ui_html))
        .nest("/api/v1/analytics", analytics::routes(service))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(&allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    service: Arc<AnalyticsService>,
    config: ServerConfig,
    shutdown: ShutdownService,
}

impl ApiServer {
    pub fn new(
        service: Arc<AnalyticsService>,
        config: ServerConfig,
        shutdown: ShutdownService,
    ) -> Self {
        Self {
            service,
            config,
            shutdown,
        }
    }

    /// Serve until the shutdown signal fires
    pub async fn start(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .host
                .parse()
                .with_context(|| format!("Invalid bind address: {}", self.config.host))?,
            self.config.port,
        );

        let router = router(self.service, &self.config);

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::debug!(%addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(self.shutdown.wait())
            .await?;

        Ok(())
    }
}
