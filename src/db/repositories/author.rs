use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{authors, prelude::*};
use crate::forms::register::NewAuthor;

/// Author data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Author {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<authors::Model> for Author {
    fn from(model: authors::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AuthorRepository {
    conn: DatabaseConnection,
}

impl AuthorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates an account from a validated registration form.
    ///
    /// The confirmation field was already discarded by the validator; only
    /// the hash of the raw password is stored. A concurrent registration
    /// with the same email loses to the unique column and surfaces here as
    /// a database error.
    pub async fn create(&self, new: NewAuthor, security: &SecurityConfig) -> Result<Author> {
        let password = new.password;
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = authors::ActiveModel {
            username: Set(new.username),
            email: Set(new.email),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            password_hash: Set(password_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert author")?;

        Ok(Author::from(model))
    }

    /// Storage read backing the email-uniqueness field check.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = Authors::find()
            .filter(authors::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to query author by email")?;

        Ok(count > 0)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Author>> {
        let author = Authors::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query author by ID")?;

        Ok(author.map(Author::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Author>> {
        let author = Authors::find()
            .filter(authors::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query author by username")?;

        Ok(author.map(Author::from))
    }

    /// Verifies a password and returns the matching author on success.
    /// Note: uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Author>> {
        let author = Authors::find()
            .filter(authors::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query author for password verification")?;

        let Some(author) = author else {
            return Ok(None);
        };

        let password_hash = author.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| Author::from(author)))
    }
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None, // output length (use default)
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
