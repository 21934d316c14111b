//! Navigation session API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::{error, parse_date, parse_locale, success, ApiResult};
use crate::views::{NavAction, SessionView};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// POST /api/sessions - Open a navigation session on the fleet overview.
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> ApiResult<SessionView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let request = body.map(|Json(request)| request).unwrap_or_default();

    let date = match request.date.as_deref() {
        Some(raw) => match parse_date(Some(raw)) {
            Ok(date) => Some(date),
            Err(e) => return error(e, revision_id),
        },
        None => None,
    };
    let locale = match parse_locale(request.locale.as_deref(), state.config.default_locale) {
        Ok(locale) => locale,
        Err(e) => return error(e, revision_id),
    };

    match state.sessions.create(date, locale).await {
        Ok(view) => success(view, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/sessions/:id - Current state and view of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.sessions.get(&id).await {
        Ok(view) => success(view, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/sessions/:id - Close a session.
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.sessions.remove(&id).await {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/sessions/:id/navigate - Apply a navigation action.
pub async fn navigate_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(action): Json<NavAction>,
) -> ApiResult<SessionView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.sessions.navigate(&id, &action).await {
        Ok(view) => success(view, revision_id),
        Err(e) => error(e, revision_id),
    }
}
