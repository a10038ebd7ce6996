//! Core application infrastructure

pub(crate) mod banner;
pub mod cli;
pub mod clock;
pub mod config;
pub mod constants;
pub mod scheduler;
pub mod shutdown;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AnalyticsConfig, AppConfig, FeedsConfig, ServerConfig};
pub use scheduler::PollScheduler;
pub use shutdown::ShutdownService;
