//! Core application

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, Commands};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::AppConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::core::scheduler::PollScheduler;
use crate::core::shutdown::ShutdownService;
use crate::data::HttpFeedClient;
use crate::data::types::{EndpointAnalyticsPage, EventPage};
use crate::domain::analytics::{
    AnalyticsService, AnalyticsSnapshot, EndpointReport, SnapshotOptions, build_endpoint_report,
    build_snapshot_from_raw,
};
use crate::utils::file::read_json_file;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub analytics: Arc<AnalyticsService>,
    pub scheduler: Arc<PollScheduler>,
}

/// Output of the `aggregate` command
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateOutput {
    snapshot: AnalyticsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoints: Option<EndpointReport>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let config = AppConfig::load(&cli_config)?;

        match command {
            Some(Commands::Aggregate {
                events,
                endpoints,
                pretty,
            }) => Self::aggregate_files(&config, &events, endpoints.as_deref(), pretty),
            Some(Commands::Start) | None => Self::init(config)?.start_server().await,
        }
    }

    fn init(config: AppConfig) -> Result<Self> {
        let feeds = HttpFeedClient::new(&config.feeds).context("Failed to build feed client")?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let analytics = Arc::new(AnalyticsService::new(
            Arc::new(feeds),
            Arc::clone(&clock),
            config.analytics.clone(),
            config.feeds.page_limit,
        ));
        let scheduler = Arc::new(PollScheduler::new(
            Duration::from_secs(config.analytics.poll_interval_secs),
            clock,
        ));

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            analytics,
            scheduler,
        })
    }

    /// Compute a snapshot (and optionally an endpoint report) from feed dumps on disk
    fn aggregate_files(
        config: &AppConfig,
        events_path: &Path,
        endpoints_path: Option<&Path>,
        pretty: bool,
    ) -> Result<()> {
        let now = SystemClock.now();
        let options = SnapshotOptions::new(config.analytics.timeframe, now)
            .with_timezone(config.analytics.timezone)
            .with_top_paths(config.analytics.top_paths);

        let page: EventPage = read_json_file(events_path)?;
        let snapshot = build_snapshot_from_raw(page.records, &options);

        let endpoints = endpoints_path
            .map(read_json_file::<EndpointAnalyticsPage>)
            .transpose()?
            .map(|page| build_endpoint_report(page, now));

        tracing::debug!(
            events = snapshot.summary.total_events,
            skipped = snapshot.summary.skipped_records,
            "Aggregated event file"
        );

        let output = AggregateOutput {
            snapshot,
            endpoints,
        };
        let json = if pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        println!("{}", json);
        Ok(())
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        self.shutdown.install_signal_handlers();

        self.start_background_tasks().await;
        banner::print_banner(&self.config);

        let server = ApiServer::new(
            Arc::clone(&self.analytics),
            self.config.server.clone(),
            self.shutdown.clone(),
        );
        let result = server.start().await;
        self.shutdown.shutdown().await;

        result
    }

    pub async fn start_background_tasks(&self) {
        if !self.analytics.start_polling(&self.scheduler) {
            tracing::warn!("Poll scheduler already running");
        }
        self.shutdown
            .register_scheduler(Arc::clone(&self.scheduler))
            .await;

        tracing::debug!(
            interval_secs = self.scheduler.interval().as_secs(),
            "Background tasks started"
        );
    }
}
