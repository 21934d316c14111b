//! Template assignment API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{after_write, error, success, ApiResult};
use crate::models::{CreateAssignmentRequest, TemplateAssignment, UpdateAssignmentRequest};
use crate::realtime::{ChangeKind, ChangeTable};
use crate::AppState;

/// POST /api/assignments - Assign a template to a restaurant.
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(request): Json<CreateAssignmentRequest>,
) -> ApiResult<TemplateAssignment> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_assignment(&request).await {
        Ok(assignment) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Assignments,
                ChangeKind::Insert,
                Some(&assignment.restaurant_id),
                revision_id,
            )
            .await;
            success(assignment, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/assignments/:id - Enable or disable an assignment.
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAssignmentRequest>,
) -> ApiResult<TemplateAssignment> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.set_assignment_enabled(&id, request.enabled).await {
        Ok(assignment) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Assignments,
                ChangeKind::Update,
                Some(&assignment.restaurant_id),
                revision_id,
            )
            .await;
            success(assignment, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/assignments/:id - Remove an assignment.
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_assignment(&id).await {
        Ok(removed) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Assignments,
                ChangeKind::Delete,
                Some(&removed.restaurant_id),
                revision_id,
            )
            .await;
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
