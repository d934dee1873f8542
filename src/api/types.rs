use serde::{Deserialize, Serialize};

use crate::db::Author;
use crate::entities::recipes;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorDto {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: String,
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            email: author.email,
            created_at: author.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub preparation_time: i32,
    pub preparation_time_unit: String,
    pub servings: i32,
    pub servings_unit: String,
    pub preparation_steps: String,
    pub preparation_step_is_html: bool,
    pub cover_path: Option<String>,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<recipes::Model> for RecipeDto {
    fn from(model: recipes::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            preparation_time: model.preparation_time,
            preparation_time_unit: model.preparation_time_unit,
            servings: model.servings,
            servings_unit: model.servings_unit,
            preparation_steps: model.preparation_steps,
            preparation_step_is_html: model.preparation_step_is_html,
            cover_path: model.cover_path,
            is_published: model.is_published,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Editable form state: `recipe` is absent in create mode and pre-populated
/// when editing an owned draft.
#[derive(Debug, Serialize)]
pub struct RecipeFormDto {
    pub recipe: Option<RecipeDto>,
}

/// Successful save: the id the row ended up with and where the client
/// should navigate next (the edit view for that id).
#[derive(Debug, Serialize)]
pub struct SavedRecipeDto {
    pub id: i32,
    pub message: String,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub username: String,
}
