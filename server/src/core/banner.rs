//! Startup banner and URL display

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;
use crate::utils::terminal::terminal_link;

// Label column width
const W: usize = 12;

/// Print the startup banner with URLs and the feeds being polled
pub fn print_banner(config: &AppConfig) {
    let host = config.server.host.as_str();
    let port = config.server.port;

    // Use localhost for display when binding to all interfaces
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let api_url = format!("http://{}:{}/api/v1/analytics/latest", display_host, port);
    let docs_url = format!("http://{}:{}/api/docs", display_host, port);
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Latest:",
        terminal_link(&api_url)
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "API docs:",
        terminal_link(&docs_url)
    );

    for (label, url) in [
        ("Events:", &config.feeds.events_url),
        ("Endpoints:", &config.feeds.endpoints_url),
    ] {
        match url {
            Some(url) => println!("  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}", label, url),
            None => println!("  \x1b[90m➜  {:<W$} not configured\x1b[0m", label),
        }
    }

    println!(
        "  \x1b[90m➜  {:<W$} every {}s, timeframe {}, {}\x1b[0m",
        "Polling:",
        config.analytics.poll_interval_secs,
        config.analytics.timeframe,
        config.analytics.timezone.name()
    );

    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    println!();
}
