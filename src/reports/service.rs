//! Report loading: consistent snapshots in, cached reports out.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::aggregate::{build_overview, build_restaurant_report, FleetOverview, RestaurantReport};
use super::cache::ReportCache;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::Submission;
use crate::render::{render_payload, resolve_kind, ChecklistSummary, Locale, RenderContext, ResolvedKind};

/// A single submission rendered for the detail view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub restaurant_name: String,
    pub template_name: String,
    pub layout: ResolvedKind,
    pub submitted_at_display: String,
    pub submission_date_display: String,
    pub summary: ChecklistSummary,
    /// Set when the summary has nothing to show
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub locale: Locale,
}

/// Loads reports through the repository and the revision-tagged cache.
#[derive(Clone)]
pub struct ReportService {
    repo: Arc<Repository>,
    cache: Arc<ReportCache>,
}

impl ReportService {
    pub fn new(repo: Arc<Repository>, cache: Arc<ReportCache>) -> Self {
        Self { repo, cache }
    }

    pub fn cache(&self) -> Arc<ReportCache> {
        self.cache.clone()
    }

    /// Ranked fleet overview for a date.
    pub async fn overview(&self, date: NaiveDate) -> Result<FleetOverview, AppError> {
        let current = self.repo.get_revision_id().await?;
        if let Some(cached) = self.cache.overview(date, current).await {
            tracing::trace!("Overview cache hit for {} at revision {}", date, current);
            return Ok(cached);
        }

        let snapshot = self.repo.fleet_snapshot(date).await?;
        let overview = build_overview(&snapshot);
        self.cache.store_overview(&overview).await;
        tracing::debug!(
            "Computed overview for {} at revision {} ({} ranked, {} unassigned)",
            date,
            overview.revision_id,
            overview.ranking.len(),
            overview.unassigned.len()
        );
        Ok(overview)
    }

    /// Detail report for one restaurant and date.
    pub async fn restaurant(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
    ) -> Result<RestaurantReport, AppError> {
        let current = self.repo.get_revision_id().await?;
        if let Some(cached) = self.cache.restaurant(restaurant_id, date, current).await {
            return Ok(cached);
        }

        let not_found = || AppError::NotFound(format!("Restaurant {} not found", restaurant_id));
        let snapshot = self
            .repo
            .restaurant_snapshot(restaurant_id, date)
            .await?
            .ok_or_else(not_found)?;
        let report = build_restaurant_report(&snapshot, restaurant_id).ok_or_else(not_found)?;
        self.cache.store_restaurant(&report).await;
        Ok(report)
    }

    /// Render one submission's payload.
    pub async fn submission_detail(
        &self,
        submission_id: &str,
        ctx: &RenderContext,
    ) -> Result<SubmissionDetail, AppError> {
        let submission = self
            .repo
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", submission_id)))?;

        let template = self.repo.get_template(&submission.template_id).await?;
        let restaurant_name = self
            .repo
            .get_restaurant(&submission.restaurant_id)
            .await?
            .map(|r| r.name)
            .unwrap_or_else(|| submission.restaurant_id.clone());

        let (template_name, type_code) = match &template {
            Some(t) => (t.name.clone(), t.type_code),
            None => (
                submission
                    .template_name
                    .clone()
                    .unwrap_or_else(|| submission.template_id.clone()),
                None,
            ),
        };

        let layout = resolve_kind(type_code, &template_name);
        let summary = render_payload(layout, &submission.data, ctx);
        let notice = summary.is_empty().then(|| ctx.no_entries().to_string());

        Ok(SubmissionDetail {
            restaurant_name,
            template_name,
            layout,
            submitted_at_display: ctx.format_timestamp(&submission.submitted_at),
            submission_date_display: ctx
                .format_date(&submission.submission_date.format("%Y-%m-%d").to_string()),
            summary,
            notice,
            locale: ctx.locale,
            submission,
        })
    }
}
