//! Analytics API endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use self::types::{AggregateRequest, MergeRequest, SnapshotQuery};
use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::types::{ApiError, parse_timestamp_param, parse_timezone_param};
use crate::domain::analytics::{
    AnalyticsService, AnalyticsSnapshot, EndpointReport, LatestSnapshot, Timeframe,
    build_endpoint_report, build_snapshot_from_raw,
};

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AnalyticsApiState {
    pub service: Arc<AnalyticsService>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(service: Arc<AnalyticsService>) -> Router<()> {
    let state = AnalyticsApiState { service };
    Router::new()
        .route("/latest", get(get_latest))
        .route("/snapshot", get(get_snapshot))
        .route("/endpoints", get(get_endpoints))
        .route("/endpoints/merge", post(merge_endpoints))
        .route("/aggregate", post(aggregate))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Latest polled snapshot with refresh status
#[utoipa::path(
    get,
    path = "/api/v1/analytics/latest",
    tag = "analytics",
    responses(
        (status = 200, description = "Last published snapshot, endpoint metrics and poll status")
    )
)]
pub async fn get_latest(State(state): State<AnalyticsApiState>) -> Json<Arc<LatestSnapshot>> {
    Json(state.service.latest())
}

/// Fetch the event feed and compute a snapshot now
#[utoipa::path(
    get,
    path = "/api/v1/analytics/snapshot",
    tag = "analytics",
    params(
        ("timeframe" = Option<String>, Query, description = "hour, day, week or all (default from config)"),
        ("timezone" = Option<String>, Query, description = "IANA timezone for timeline buckets (e.g., America/New_York)")
    ),
    responses(
        (status = 200, description = "Freshly computed snapshot"),
        (status = 400, description = "Unknown timezone")
    )
)]
pub async fn get_snapshot(
    State(state): State<AnalyticsApiState>,
    ValidatedQuery(query): ValidatedQuery<SnapshotQuery>,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    let config = state.service.config();
    let timeframe = query
        .timeframe
        .as_deref()
        .map(Timeframe::parse)
        .unwrap_or(config.timeframe);
    let timezone = parse_timezone_param(&query.timezone, config.timezone)?;

    Ok(Json(state.service.snapshot_for(timeframe, timezone).await))
}

/// Fetch the endpoint analytics feed and merge it now
#[utoipa::path(
    get,
    path = "/api/v1/analytics/endpoints",
    tag = "analytics",
    responses(
        (status = 200, description = "Merged endpoint metrics")
    )
)]
pub async fn get_endpoints(State(state): State<AnalyticsApiState>) -> Json<EndpointReport> {
    Json(state.service.endpoint_report().await)
}

/// Compute a snapshot from a posted event batch
#[utoipa::path(
    post,
    path = "/api/v1/analytics/aggregate",
    tag = "analytics",
    responses(
        (status = 200, description = "Snapshot of the posted batch"),
        (status = 400, description = "Malformed body, unknown timezone or invalid timestamp")
    )
)]
pub async fn aggregate(
    State(state): State<AnalyticsApiState>,
    ValidatedJson(req): ValidatedJson<AggregateRequest>,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    let config = state.service.config();
    let timeframe = req
        .timeframe
        .as_deref()
        .map(Timeframe::parse)
        .unwrap_or(config.timeframe);
    let timezone = parse_timezone_param(&req.timezone, config.timezone)?;

    let mut options = state.service.options(timeframe, timezone);
    if let Some(now) = parse_timestamp_param(&req.now)? {
        options.now = now;
    }
    if let Some(top_paths) = req.top_paths {
        options = options.with_top_paths(top_paths);
    }

    Ok(Json(build_snapshot_from_raw(req.events, &options)))
}

/// Merge a posted endpoint batch
#[utoipa::path(
    post,
    path = "/api/v1/analytics/endpoints/merge",
    tag = "analytics",
    responses(
        (status = 200, description = "Merged endpoint metrics of the posted batch")
    )
)]
pub async fn merge_endpoints(
    State(state): State<AnalyticsApiState>,
    ValidatedJson(req): ValidatedJson<MergeRequest>,
) -> Json<EndpointReport> {
    Json(build_endpoint_report(req.into(), state.service.now()))
}
