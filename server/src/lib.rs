//! Clickstream analytics engine
//!
//! Turns raw user-interaction events and per-endpoint performance records
//! into sessions, journeys, distributions and merged endpoint metrics, and
//! serves the latest result over HTTP.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
