//! The author dashboard: listing, creating, editing and deleting draft
//! recipes, every operation scoped to the authenticated caller.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentAuthor;
use super::events::NotificationEvent;
use super::types::{MessageResponse, RecipeDto, RecipeFormDto, SavedRecipeDto};
use super::{ApiError, ApiResponse, AppState};
use crate::entities::recipes;
use crate::forms::recipe::{self, RecipePayload};

pub const DASHBOARD_PATH: &str = "/api/dashboard";

/// The one ownership lookup shared by view, edit and delete.
///
/// A recipe resolves only when the id exists, belongs to the caller and is
/// still a draft. Everything else collapses into the same "not found" so
/// other authors' and published recipe ids cannot be probed.
async fn resolve_owned_draft(
    state: &AppState,
    caller: &CurrentAuthor,
    id: i32,
) -> Result<recipes::Model, ApiError> {
    state
        .store()
        .find_owned_draft(id, caller.id)
        .await
        .map_err(|e| ApiError::database(format!("Recipe lookup failed: {e}")))?
        .ok_or_else(ApiError::recipe_not_found)
}

fn edit_path(id: i32) -> String {
    format!("{DASHBOARD_PATH}/recipes/{id}")
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /dashboard
/// The caller's drafts, newest first.
pub async fn list_drafts(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentAuthor>,
) -> Result<Json<ApiResponse<Vec<RecipeDto>>>, ApiError> {
    let drafts = state
        .store()
        .list_author_drafts(caller.id)
        .await
        .map_err(|e| ApiError::database(format!("Failed to list drafts: {e}")))?;

    let dtos = drafts.into_iter().map(RecipeDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /dashboard/recipes/new
/// Blank form for create mode. Pure, no side effects.
pub async fn new_recipe_form() -> Json<ApiResponse<RecipeFormDto>> {
    Json(ApiResponse::success(RecipeFormDto { recipe: None }))
}

/// GET /dashboard/recipes/{id}
/// Form pre-populated from an owned draft, or 404.
pub async fn get_recipe_form(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentAuthor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeFormDto>>, ApiError> {
    let recipe = resolve_owned_draft(&state, &caller, id).await?;

    Ok(Json(ApiResponse::success(RecipeFormDto {
        recipe: Some(RecipeDto::from(recipe)),
    })))
}

/// POST /dashboard/recipes
/// Validates the form and inserts a new draft owned by the caller. The
/// publication and HTML flags are forced off no matter what was submitted.
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentAuthor>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<ApiResponse<SavedRecipeDto>>, ApiError> {
    let draft = recipe::validate(&payload)?;

    let saved = state
        .store()
        .insert_recipe(caller.id, &draft)
        .await
        .map_err(|e| ApiError::database(format!("Failed to save recipe: {e}")))?;

    let _ = state.event_bus().send(NotificationEvent::RecipeSaved {
        id: saved.id,
        title: saved.title.clone(),
    });

    Ok(Json(ApiResponse::success(SavedRecipeDto {
        id: saved.id,
        message: "Your recipe was successfully saved".to_string(),
        redirect: edit_path(saved.id),
    })))
}

/// POST /dashboard/recipes/{id}
/// Same resolution as the edit form, then applies the validated payload
/// over the existing draft.
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentAuthor>,
    Path(id): Path<i32>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<ApiResponse<SavedRecipeDto>>, ApiError> {
    let existing = resolve_owned_draft(&state, &caller, id).await?;

    let draft = recipe::validate(&payload)?;

    let saved = state
        .store()
        .update_recipe(existing, &draft)
        .await
        .map_err(|e| ApiError::database(format!("Failed to save recipe: {e}")))?;

    let _ = state.event_bus().send(NotificationEvent::RecipeSaved {
        id: saved.id,
        title: saved.title.clone(),
    });

    Ok(Json(ApiResponse::success(SavedRecipeDto {
        id: saved.id,
        message: "Your recipe was successfully saved".to_string(),
        redirect: edit_path(saved.id),
    })))
}

/// DELETE /dashboard/recipes/{id}
/// Resolves ownership exactly like edit, then removes the row for good.
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentAuthor>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let recipe = resolve_owned_draft(&state, &caller, id).await?;
    let title = recipe.title.clone();

    state
        .store()
        .delete_recipe(recipe)
        .await
        .map_err(|e| ApiError::database(format!("Failed to delete recipe: {e}")))?;

    let _ = state
        .event_bus()
        .send(NotificationEvent::RecipeDeleted { id, title });

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Deleted successfully".to_string(),
        redirect: Some(DASHBOARD_PATH.to_string()),
    })))
}
