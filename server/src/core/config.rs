use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::domain::analytics::Timeframe;
use crate::domain::analytics::journeys::DEFAULT_TOP_PATHS;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_FEED_RETRIES, DEFAULT_FEED_TIMEOUT_SECS,
    DEFAULT_HOST, DEFAULT_PAGE_LIMIT, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PORT, DEFAULT_TIMEZONE,
    MAX_TOP_PATHS, MIN_POLL_INTERVAL_SECS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Feed configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FeedsFileConfig {
    pub events_url: Option<String>,
    pub endpoints_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub page_limit: Option<u64>,
}

/// Analytics configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalyticsFileConfig {
    pub timeframe: Option<Timeframe>,
    pub timezone: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub top_paths: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub feeds: Option<FeedsFileConfig>,
    pub analytics: Option<AnalyticsFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        // Feeds
        if let Some(feeds) = other.feeds {
            let current = self.feeds.get_or_insert_with(FeedsFileConfig::default);
            if feeds.events_url.is_some() {
                tracing::trace!(url = ?feeds.events_url, "Merging feeds.events_url");
                current.events_url = feeds.events_url;
            }
            if feeds.endpoints_url.is_some() {
                tracing::trace!(url = ?feeds.endpoints_url, "Merging feeds.endpoints_url");
                current.endpoints_url = feeds.endpoints_url;
            }
            if feeds.timeout_secs.is_some() {
                tracing::trace!(timeout = ?feeds.timeout_secs, "Merging feeds.timeout_secs");
                current.timeout_secs = feeds.timeout_secs;
            }
            if feeds.retries.is_some() {
                tracing::trace!(retries = ?feeds.retries, "Merging feeds.retries");
                current.retries = feeds.retries;
            }
            if feeds.page_limit.is_some() {
                tracing::trace!(limit = ?feeds.page_limit, "Merging feeds.page_limit");
                current.page_limit = feeds.page_limit;
            }
        }

        // Analytics
        if let Some(analytics) = other.analytics {
            let current = self
                .analytics
                .get_or_insert_with(AnalyticsFileConfig::default);
            if analytics.timeframe.is_some() {
                tracing::trace!(timeframe = ?analytics.timeframe, "Merging analytics.timeframe");
                current.timeframe = analytics.timeframe;
            }
            if analytics.timezone.is_some() {
                tracing::trace!(timezone = ?analytics.timezone, "Merging analytics.timezone");
                current.timezone = analytics.timezone;
            }
            if analytics.poll_interval_secs.is_some() {
                tracing::trace!(
                    interval = ?analytics.poll_interval_secs,
                    "Merging analytics.poll_interval_secs"
                );
                current.poll_interval_secs = analytics.poll_interval_secs;
            }
            if analytics.top_paths.is_some() {
                tracing::trace!(top_paths = ?analytics.top_paths, "Merging analytics.top_paths");
                current.top_paths = analytics.top_paths;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Feed client configuration
#[derive(Debug, Clone)]
pub struct FeedsConfig {
    pub events_url: Option<String>,
    pub endpoints_url: Option<String>,
    pub timeout_secs: u64,
    /// Attempts per fetch, first try included
    pub retries: u32,
    pub page_limit: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            events_url: None,
            endpoints_url: None,
            timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
            retries: DEFAULT_FEED_RETRIES,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Aggregation configuration
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub timeframe: Timeframe,
    pub timezone: Tz,
    pub poll_interval_secs: u64,
    pub top_paths: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::All,
            timezone: Tz::UTC,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            top_paths: DEFAULT_TOP_PATHS,
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub feeds: FeedsConfig,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.clickstream/clickstream.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.clickstream/clickstream.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Extract file config values with defaults
        let file_server = file_config.server.unwrap_or_default();
        let file_feeds = file_config.feeds.unwrap_or_default();
        let file_analytics = file_config.analytics.unwrap_or_default();

        // 4. Layer configs: defaults -> file config -> CLI/env overrides
        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let feeds = FeedsConfig {
            events_url: non_empty(cli.events_url.clone().or(file_feeds.events_url)),
            endpoints_url: non_empty(cli.endpoints_url.clone().or(file_feeds.endpoints_url)),
            timeout_secs: file_feeds.timeout_secs.unwrap_or(DEFAULT_FEED_TIMEOUT_SECS),
            retries: file_feeds.retries.unwrap_or(DEFAULT_FEED_RETRIES),
            page_limit: file_feeds.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        };

        let timezone_name = cli
            .timezone
            .clone()
            .or(file_analytics.timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = parse_timezone(&timezone_name)
            .map_err(|e| anyhow::anyhow!("Configuration error: analytics.timezone: {}", e))?;

        let analytics = AnalyticsConfig {
            timeframe: cli
                .timeframe
                .or(file_analytics.timeframe)
                .unwrap_or_default(),
            timezone,
            poll_interval_secs: cli
                .poll_interval
                .or(file_analytics.poll_interval_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            top_paths: cli
                .top_paths
                .or(file_analytics.top_paths)
                .unwrap_or(DEFAULT_TOP_PATHS),
        };

        let config = Self {
            server: ServerConfig { host, port },
            feeds,
            analytics,
        };

        config.validate()?;

        if is_all_interfaces(&config.server.host) {
            tracing::warn!(
                host = %config.server.host,
                "Server is listening on all network interfaces"
            );
        }
        if config.feeds.events_url.is_none() {
            tracing::warn!("No event feed configured; snapshots will be empty");
        }

        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        // Host must not be empty
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port must be non-zero (port 0 would cause bind failure)
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.feeds.timeout_secs == 0 {
            anyhow::bail!("Configuration error: feeds.timeout_secs must be greater than 0");
        }
        if self.feeds.page_limit == 0 {
            anyhow::bail!("Configuration error: feeds.page_limit must be greater than 0");
        }
        for (name, url) in [
            ("feeds.events_url", &self.feeds.events_url),
            ("feeds.endpoints_url", &self.feeds.endpoints_url),
        ] {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                anyhow::bail!("Configuration error: {} must be an http(s) URL: {}", name, url);
            }
        }

        if self.analytics.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            anyhow::bail!(
                "Configuration error: analytics.poll_interval_secs must be at least {}",
                MIN_POLL_INTERVAL_SECS
            );
        }
        if self.analytics.top_paths == 0 || self.analytics.top_paths > MAX_TOP_PATHS {
            anyhow::bail!(
                "Configuration error: analytics.top_paths must be between 1 and {}",
                MAX_TOP_PATHS
            );
        }

        Ok(())
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| {
        anyhow::anyhow!(
            "unknown timezone '{}' (expected an IANA name like Europe/Berlin)",
            name
        )
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get the profile config path (~/.clickstream/clickstream.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
