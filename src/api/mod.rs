//! REST API module.
//!
//! Contains all API routes and handlers. Every response uses the
//! `{ success, data | error, revisionId }` envelope.

mod assignments;
mod notifications;
mod reports;
mod restaurants;
mod revision;
mod sessions;
mod submissions;
mod templates;

pub use assignments::*;
pub use notifications::*;
pub use reports::*;
pub use restaurants::*;
pub use revision::*;
pub use sessions::*;
pub use submissions::*;
pub use templates::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::errors::AppError;
use crate::realtime::{ChangeEvent, ChangeKind, ChangeTable};
use crate::render::Locale;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(err.with_revision(revision_id))
}

/// Parse an optional `YYYY-MM-DD` query value. Absent means today in local time.
pub(crate) fn parse_date(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Local::now().date_naive()),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
            AppError::BadRequest(format!("Invalid date '{}' (expected YYYY-MM-DD)", value))
        }),
    }
}

/// Parse an optional locale code, falling back to the configured default.
pub(crate) fn parse_locale(raw: Option<&str>, default: Locale) -> Result<Locale, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(AppError::BadRequest),
    }
}

/// Publish a change after a successful write and return the new revision.
pub(crate) async fn after_write(
    state: &AppState,
    table: ChangeTable,
    kind: ChangeKind,
    restaurant_id: Option<&str>,
    fallback_revision: i64,
) -> i64 {
    state
        .changes
        .publish(ChangeEvent::new(table, kind, restaurant_id));
    state
        .repo
        .get_revision_id()
        .await
        .unwrap_or(fallback_revision)
}
