use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_ENDPOINTS_URL, ENV_EVENTS_URL, ENV_HOST, ENV_POLL_INTERVAL, ENV_PORT,
    ENV_TIMEFRAME, ENV_TIMEZONE,
};
use crate::domain::analytics::Timeframe;

#[derive(Parser)]
#[command(name = "clickstream")]
#[command(version, about = "Clickstream analytics aggregation engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Event feed URL
    #[arg(long, global = true, env = ENV_EVENTS_URL)]
    pub events_url: Option<String>,

    /// Endpoint analytics feed URL
    #[arg(long, global = true, env = ENV_ENDPOINTS_URL)]
    pub endpoints_url: Option<String>,

    /// Timeframe to aggregate (hour, day, week or all)
    #[arg(long, short = 't', global = true, env = ENV_TIMEFRAME, value_parser = parse_timeframe)]
    pub timeframe: Option<Timeframe>,

    /// IANA timezone for timeline buckets (e.g. Europe/Berlin)
    #[arg(long, global = true, env = ENV_TIMEZONE)]
    pub timezone: Option<String>,

    /// Seconds between feed polls
    #[arg(long, global = true, env = ENV_POLL_INTERVAL)]
    pub poll_interval: Option<u64>,

    /// Number of ranked journey paths
    #[arg(long, global = true)]
    pub top_paths: Option<usize>,
}

/// Parse timeframe from CLI/env string
fn parse_timeframe(s: &str) -> Result<Timeframe, String> {
    match s.trim().to_lowercase().as_str() {
        "hour" | "day" | "week" | "all" => Ok(Timeframe::parse(s)),
        _ => Err(format!(
            "Invalid timeframe '{}'. Valid options: hour, day, week, all",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Aggregate feed dumps offline and print the result as JSON
    Aggregate {
        /// Event feed page (JSON file)
        #[arg(long, short = 'e')]
        events: PathBuf,

        /// Endpoint analytics page (JSON file)
        #[arg(long)]
        endpoints: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub events_url: Option<String>,
    pub endpoints_url: Option<String>,
    pub timeframe: Option<Timeframe>,
    pub timezone: Option<String>,
    pub poll_interval: Option<u64>,
    pub top_paths: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        events_url: cli.events_url,
        endpoints_url: cli.endpoints_url,
        timeframe: cli.timeframe,
        timezone: cli.timezone,
        poll_interval: cli.poll_interval,
        top_paths: cli.top_paths,
    };
    (config, cli.command)
}
