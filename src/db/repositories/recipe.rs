use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set};
use tracing::info;

use crate::entities::{prelude::*, recipes};
use crate::forms::recipe::{RecipeDraft, unique_slug};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// The ownership lookup every dashboard operation goes through: a row
    /// matches only when id, owner and the draft flag all line up. Wrong
    /// owner, already published and plain nonexistent are indistinguishable
    /// to the caller.
    pub async fn find_owned_draft(
        &self,
        id: i32,
        author_id: i32,
    ) -> Result<Option<recipes::Model>> {
        let recipe = Recipes::find()
            .filter(recipes::Column::Id.eq(id))
            .filter(recipes::Column::AuthorId.eq(author_id))
            .filter(recipes::Column::IsPublished.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query recipe by owner")?;

        Ok(recipe)
    }

    /// The caller's dashboard listing: their drafts, newest first.
    pub async fn list_drafts(&self, author_id: i32) -> Result<Vec<recipes::Model>> {
        let rows = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .filter(recipes::Column::IsPublished.eq(false))
            .order_by_desc(recipes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list drafts")?;

        Ok(rows)
    }

    /// Inserts a new draft for the given owner. The publication and HTML
    /// flags are unconditionally false regardless of what the client sent.
    pub async fn insert(&self, author_id: i32, draft: &RecipeDraft) -> Result<recipes::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = recipes::ActiveModel {
            author_id: Set(author_id),
            title: Set(draft.title.clone()),
            slug: Set(unique_slug(&draft.title)),
            description: Set(draft.description.clone()),
            preparation_time: Set(draft.preparation_time),
            preparation_time_unit: Set(draft.preparation_time_unit.clone()),
            servings: Set(draft.servings),
            servings_unit: Set(draft.servings_unit.clone()),
            preparation_steps: Set(draft.preparation_steps.clone()),
            preparation_step_is_html: Set(false),
            is_published: Set(false),
            cover_path: Set(draft.cover_path.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert recipe")?;

        info!("Recipe {} created by author {}", model.id, author_id);
        Ok(model)
    }

    /// Applies a validated form over an existing draft. The slug is stable
    /// across edits; both flags are forced back to false on every save.
    pub async fn update(
        &self,
        existing: recipes::Model,
        draft: &RecipeDraft,
    ) -> Result<recipes::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: recipes::ActiveModel = existing.into();
        active.title = Set(draft.title.clone());
        active.description = Set(draft.description.clone());
        active.preparation_time = Set(draft.preparation_time);
        active.preparation_time_unit = Set(draft.preparation_time_unit.clone());
        active.servings = Set(draft.servings);
        active.servings_unit = Set(draft.servings_unit.clone());
        active.preparation_steps = Set(draft.preparation_steps.clone());
        active.preparation_step_is_html = Set(false);
        active.is_published = Set(false);
        active.cover_path = Set(draft.cover_path.clone());
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update recipe")?;

        info!("Recipe {} updated", model.id);
        Ok(model)
    }

    pub async fn delete(&self, recipe: recipes::Model) -> Result<()> {
        let id = recipe.id;
        Recipes::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete recipe")?;

        info!("Recipe {} deleted", id);
        Ok(())
    }
}
