//! Notification API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{after_write, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateNotificationRequest, Notification};
use crate::realtime::{ChangeKind, ChangeTable};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /api/restaurants/:id/notifications - Unread first, then newest.
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<Vec<Notification>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_notifications(&restaurant_id).await {
        Ok(notifications) => success(notifications, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/notifications - Create a notification.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> ApiResult<Notification> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.title.trim().is_empty() {
        return error(
            AppError::Validation("Title is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_notification(&request).await {
        Ok(notification) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Notifications,
                ChangeKind::Insert,
                Some(&notification.restaurant_id),
                revision_id,
            )
            .await;
            success(notification, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/notifications/:id/read - Mark one notification read.
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Notification> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.mark_notification_read(&id).await {
        Ok(notification) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Notifications,
                ChangeKind::Update,
                Some(&notification.restaurant_id),
                revision_id,
            )
            .await;
            success(notification, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/restaurants/:id/notifications/read-all - Mark every unread notification read.
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> ApiResult<MarkAllReadResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.mark_all_notifications_read(&restaurant_id).await {
        Ok(updated) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Notifications,
                ChangeKind::Update,
                Some(&restaurant_id),
                revision_id,
            )
            .await;
            success(MarkAllReadResponse { updated }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/notifications/:id - Delete a notification.
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_notification(&id).await {
        Ok(removed) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Notifications,
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
