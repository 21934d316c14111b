//! Checklist template API endpoints, including catalog and search.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{after_write, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    ChecklistTemplate, CreateTemplateRequest, TemplateCatalogEntry, UpdateTemplateRequest,
};
use crate::realtime::{ChangeKind, ChangeTable};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/templates - List templates ordered by name.
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateListQuery>,
) -> ApiResult<Vec<ChecklistTemplate>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_templates(query.active_only).await {
        Ok(templates) => success(templates, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/templates/:id - Get a single template.
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ChecklistTemplate> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_template(&id).await {
        Ok(Some(template)) => success(template, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Template {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/templates - Create a template.
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> ApiResult<ChecklistTemplate> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_template(&request).await {
        Ok(template) => {
            if let Err(e) = state.search.index_template(&template).await {
                tracing::warn!("Failed to index template: {}", e);
            }
            let new_revision = after_write(
                &state,
                ChangeTable::Templates,
                ChangeKind::Insert,
                None,
                revision_id,
            )
            .await;
            success(template, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/templates/:id - Update a template (optimistic concurrency via `expectedVersion`).
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> ApiResult<ChecklistTemplate> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if matches!(&request.name, Some(name) if name.trim().is_empty()) {
        return error(
            AppError::Validation("Name cannot be empty".to_string()),
            revision_id,
        );
    }

    match state.repo.update_template(&id, &request).await {
        Ok(template) => {
            if let Err(e) = state.search.index_template(&template).await {
                tracing::warn!("Failed to re-index template: {}", e);
            }
            let new_revision = after_write(
                &state,
                ChangeTable::Templates,
                ChangeKind::Update,
                None,
                revision_id,
            )
            .await;
            success(template, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/templates/catalog - Distinct templates de-duplicated by name.
pub async fn template_catalog(State(state): State<AppState>) -> ApiResult<Vec<TemplateCatalogEntry>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.template_catalog().await {
        Ok(catalog) => success(catalog, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub template: ChecklistTemplate,
    pub score: f32,
}

/// GET /api/templates/search - Full-text search over templates.
pub async fn search_templates(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    let hits = match state.search.search(&params.q, limit, params.offset) {
        Ok(hits) => hits,
        Err(e) => return error(e, revision_id),
    };

    let mut results = Vec::new();
    for hit in hits {
        if let Ok(Some(template)) = state.repo.get_template(&hit.template_id).await {
            results.push(SearchResultItem {
                template,
                score: hit.score,
            });
        }
    }

    let total = results.len();
    success(
        SearchResponse {
            results,
            total,
            limit,
            offset: params.offset,
        },
        revision_id,
    )
}
