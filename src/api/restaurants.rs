//! Restaurant API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{after_write, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateRestaurantRequest, Restaurant, TemplateAssignment, UpdateRestaurantRequest};
use crate::realtime::{ChangeKind, ChangeTable};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /api/restaurants - List restaurants ordered by name.
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(query): Query<RestaurantListQuery>,
) -> ApiResult<Vec<Restaurant>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_restaurants(query.include_inactive).await {
        Ok(restaurants) => success(restaurants, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/restaurants/:id - Get a single restaurant.
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Restaurant> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_restaurant(&id).await {
        Ok(Some(restaurant)) => success(restaurant, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Restaurant {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/restaurants - Create a restaurant.
pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(request): Json<CreateRestaurantRequest>,
) -> ApiResult<Restaurant> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_restaurant(&request).await {
        Ok(restaurant) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Restaurants,
                ChangeKind::Insert,
                Some(&restaurant.id),
                revision_id,
            )
            .await;
            success(restaurant, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/restaurants/:id - Update name, email or active flag.
pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRestaurantRequest>,
) -> ApiResult<Restaurant> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if matches!(&request.name, Some(name) if name.trim().is_empty()) {
        return error(
            AppError::Validation("Name cannot be empty".to_string()),
            revision_id,
        );
    }

    match state.repo.update_restaurant(&id, &request).await {
        Ok(restaurant) => {
            let new_revision = after_write(
                &state,
                ChangeTable::Restaurants,
                ChangeKind::Update,
                Some(&restaurant.id),
                revision_id,
            )
            .await;
            success(restaurant, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/restaurants/:id/assignments - List a restaurant's template assignments.
pub async fn list_restaurant_assignments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<TemplateAssignment>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_restaurant(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Restaurant {} not found", id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    }

    match state.repo.list_assignments_for_restaurant(&id).await {
        Ok(assignments) => success(assignments, revision_id),
        Err(e) => error(e, revision_id),
    }
}
