//! Submission API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{after_write, error, parse_date, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateSubmissionRequest, Submission, SubmissionFilter};
use crate::realtime::{ChangeKind, ChangeTable};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionListQuery {
    pub restaurant_id: Option<String>,
    pub date: Option<String>,
}

/// GET /api/submissions - List submissions filtered by restaurant and/or date.
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionListQuery>,
) -> ApiResult<Vec<Submission>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let date = match query.date.as_deref() {
        Some(raw) => match parse_date(Some(raw)) {
            Ok(date) => Some(date),
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };
    let filter = SubmissionFilter {
        restaurant_id: query.restaurant_id,
        date,
    };

    match state.repo.list_submissions(&filter).await {
        Ok(submissions) => success(submissions, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/submissions/:id - Get a single submission.
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Submission> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_submission(&id).await {
        Ok(Some(submission)) => success(submission, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Submission {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/submissions - Record a filled-in checklist.
pub async fn create_submission(
    State(state): State<AppState>,
    Json(request): Json<CreateSubmissionRequest>,
) -> ApiResult<Submission> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.submitted_by.trim().is_empty() {
        return error(
            AppError::Validation("submittedBy is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_submission(&request).await {
        Ok(submission) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Submissions,
                ChangeKind::Insert,
                Some(&submission.restaurant_id),
                revision_id,
            )
            .await;
            success(submission, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
