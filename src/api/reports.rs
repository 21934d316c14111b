//! Report API endpoints: fleet overview, restaurant detail, submission detail.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{error, parse_date, parse_locale, success, ApiResult};
use crate::render::RenderContext;
use crate::reports::{FleetOverview, RestaurantReport, SubmissionDetail};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportDateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

/// GET /api/reports/overview - Ranked fleet overview for a date (default today).
pub async fn fleet_overview(
    State(state): State<AppState>,
    Query(query): Query<ReportDateQuery>,
) -> ApiResult<FleetOverview> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let date = match parse_date(query.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return error(e, revision_id),
    };

    match state.reports.overview(date).await {
        Ok(overview) => {
            let as_of = overview.revision_id;
            success(overview, as_of)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/reports/restaurants/:id - Completed and missing checklists for one restaurant.
pub async fn restaurant_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReportDateQuery>,
) -> ApiResult<RestaurantReport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let date = match parse_date(query.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return error(e, revision_id),
    };

    match state.reports.restaurant(&id, date).await {
        Ok(report) => {
            let as_of = report.revision_id;
            success(report, as_of)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/reports/submissions/:id - Rendered submission payload.
pub async fn submission_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> ApiResult<SubmissionDetail> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let locale = match parse_locale(query.locale.as_deref(), state.config.default_locale) {
        Ok(locale) => locale,
        Err(e) => return error(e, revision_id),
    };

    match state
        .reports
        .submission_detail(&id, &RenderContext::new(locale))
        .await
    {
        Ok(detail) => success(detail, revision_id),
        Err(e) => error(e, revision_id),
    }
}
