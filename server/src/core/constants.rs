// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Clickstream";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".clickstream";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "clickstream.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CLICKSTREAM_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "CLICKSTREAM_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "CLICKSTREAM_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CLICKSTREAM_LOG";

/// Log filter used when neither `CLICKSTREAM_LOG` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info,clickstream=info";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Maximum request body size for posted batches
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

// =============================================================================
// Environment Variables - Feeds
// =============================================================================

/// Environment variable for the event feed URL
pub const ENV_EVENTS_URL: &str = "CLICKSTREAM_EVENTS_URL";

/// Environment variable for the endpoint analytics feed URL
pub const ENV_ENDPOINTS_URL: &str = "CLICKSTREAM_ENDPOINTS_URL";

// =============================================================================
// Feed Defaults
// =============================================================================

/// Per-request timeout for feed fetches
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;

/// Attempts per feed fetch (first try included)
pub const DEFAULT_FEED_RETRIES: u32 = 2;

/// Base delay between feed retries, doubled per attempt
pub const FEED_RETRY_BASE_DELAY_MS: u64 = 200;

/// Event feed page size
pub const DEFAULT_PAGE_LIMIT: u64 = 1000;

// =============================================================================
// Environment Variables - Analytics
// =============================================================================

/// Environment variable for the polled timeframe
pub const ENV_TIMEFRAME: &str = "CLICKSTREAM_TIMEFRAME";

/// Environment variable for the timeline timezone
pub const ENV_TIMEZONE: &str = "CLICKSTREAM_TIMEZONE";

/// Environment variable for the poll interval
pub const ENV_POLL_INTERVAL: &str = "CLICKSTREAM_POLL_INTERVAL_SECS";

// =============================================================================
// Analytics Defaults
// =============================================================================

/// Timezone for timeline buckets
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Seconds between feed polls
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Shortest accepted poll interval
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Upper bound on the number of ranked journey paths
pub const MAX_TOP_PATHS: usize = 100;
