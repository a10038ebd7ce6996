//! Shared API types
//!
//! Error responses and request parameter parsing shared by all endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use validator::ValidationError;

use crate::core::config::parse_timezone;

/// Maximum records accepted in one posted batch
pub const MAX_BATCH_RECORDS: usize = 100_000;

/// Validator function for posted record batches
pub fn validate_batch_size<T>(records: &[T]) -> Result<(), ValidationError> {
    if records.len() > MAX_BATCH_RECORDS {
        return Err(ValidationError::new("batch_too_large").with_message(
            format!(
                "Cannot process more than {} records at once",
                MAX_BATCH_RECORDS
            )
            .into(),
        ));
    }
    Ok(())
}

/// Parse an optional timestamp string parameter (RFC 3339 / ISO 8601 format)
pub fn parse_timestamp_param(s: &Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match s {
        Some(ts) => DateTime::parse_from_rfc3339(ts)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                ApiError::bad_request(
                    "INVALID_TIMESTAMP",
                    format!("Invalid timestamp format: {}. Use ISO 8601 format.", ts),
                )
            }),
        None => Ok(None),
    }
}

/// Parse an optional IANA timezone parameter, falling back to `default`
pub fn parse_timezone_param(s: &Option<String>, default: Tz) -> Result<Tz, ApiError> {
    match s.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => parse_timezone(name)
            .map_err(|e| ApiError::bad_request("INVALID_TIMEZONE", e.to_string())),
        None => Ok(default),
    }
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
