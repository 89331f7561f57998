//! Repositories for database operations
//!
//! Each repository is a thin, cloneable handle over the shared
//! connection pool. Constraint violations are classified into
//! [`RepoError`] variants so the route layer can translate them into the
//! API error taxonomy instead of surfacing a 500.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::User;

pub mod notifications;
pub mod posts;
pub mod social;
pub mod stories;

/// Errors surfaced by repositories
#[derive(Error, Debug)]
pub enum RepoError {
    /// Insert hit a uniqueness constraint (SQLSTATE 23505)
    #[error("duplicate row violates constraint {0}")]
    Duplicate(String),

    /// Insert referenced a missing row (SQLSTATE 23503)
    #[error("missing referenced row for constraint {0}")]
    MissingReference(String),

    /// Row violated a check constraint (SQLSTATE 23514)
    #[error("row violates check constraint {0}")]
    CheckViolation(String),

    /// A stored value could not be decoded into its domain type
    #[error("unexpected stored value: {0}")]
    Decode(String),

    /// Password hashing or verification failed
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Any other database error
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let constraint = db.constraint().unwrap_or_default().to_string();
            match db.code().as_deref() {
                Some("23505") => return RepoError::Duplicate(constraint),
                Some("23503") => return RepoError::MissingReference(constraint),
                Some("23514") => return RepoError::CheckViolation(constraint),
                _ => {}
            }
        }
        RepoError::Sqlx(e)
    }
}

/// Type alias for repository results
pub type RepoResult<T> = Result<T, RepoError>;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user with an argon2-hashed password
    ///
    /// A duplicate username or email surfaces as [`RepoError::Duplicate`].
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> RepoResult<User> {
        debug!("Creating user: {}", username);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| RepoError::PasswordHash(e.to_string()))?
            .to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, bio, avatar_url, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by exact username or email
    pub async fn find_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, bio, avatar_url, created_at
            FROM users
            WHERE username = $1 OR email = $1
            "#,
        )
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, bio, avatar_url, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a password against a user's stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> RepoResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| RepoError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Apply a partial profile update
    ///
    /// `bio` replaces the stored bio when present; `avatar_url` is a
    /// double option so an explicit `null` clears the avatar while an
    /// absent field leaves it untouched.
    pub async fn update_profile(
        &self,
        id: Uuid,
        bio: Option<&str>,
        avatar_url: Option<Option<&str>>,
    ) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET bio = COALESCE($2, bio),
                avatar_url = CASE WHEN $3 THEN $4 ELSE avatar_url END
            WHERE id = $1
            RETURNING id, username, email, password_hash, bio, avatar_url, created_at
            "#,
        )
        .bind(id)
        .bind(bio)
        .bind(avatar_url.is_some())
        .bind(avatar_url.flatten())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
