use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::recipes;
use crate::forms::recipe::RecipeDraft;
use crate::forms::register::NewAuthor;

pub mod migrator;
pub mod repositories;

pub use repositories::author::Author;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn author_repo(&self) -> repositories::author::AuthorRepository {
        repositories::author::AuthorRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    // ========== Author Repository Methods ==========

    pub async fn create_author(&self, new: NewAuthor, security: &SecurityConfig) -> Result<Author> {
        self.author_repo().create(new, security).await
    }

    pub async fn author_email_exists(&self, email: &str) -> Result<bool> {
        self.author_repo().email_exists(email).await
    }

    pub async fn get_author_by_id(&self, id: i32) -> Result<Option<Author>> {
        self.author_repo().get_by_id(id).await
    }

    pub async fn get_author_by_username(&self, username: &str) -> Result<Option<Author>> {
        self.author_repo().get_by_username(username).await
    }

    pub async fn verify_author_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Author>> {
        self.author_repo().verify_password(username, password).await
    }

    // ========== Recipe Repository Methods ==========

    pub async fn find_owned_draft(
        &self,
        id: i32,
        author_id: i32,
    ) -> Result<Option<recipes::Model>> {
        self.recipe_repo().find_owned_draft(id, author_id).await
    }

    pub async fn list_author_drafts(&self, author_id: i32) -> Result<Vec<recipes::Model>> {
        self.recipe_repo().list_drafts(author_id).await
    }

    pub async fn insert_recipe(
        &self,
        author_id: i32,
        draft: &RecipeDraft,
    ) -> Result<recipes::Model> {
        self.recipe_repo().insert(author_id, draft).await
    }

    pub async fn update_recipe(
        &self,
        existing: recipes::Model,
        draft: &RecipeDraft,
    ) -> Result<recipes::Model> {
        self.recipe_repo().update(existing, draft).await
    }

    pub async fn delete_recipe(&self, recipe: recipes::Model) -> Result<()> {
        self.recipe_repo().delete(recipe).await
    }
}
