//! Story repository
//!
//! Stories are never deleted; visibility is governed entirely by the
//! `expires_at` filter on reads.

use chrono::{Duration, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::story::{MediaType, NewStoryRequest, StoryView};
use crate::repositories::{RepoError, RepoResult, posts::author_from_row};

/// Story repository
#[derive(Clone)]
pub struct StoryRepository {
    pool: PgPool,
}

impl StoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch all unexpired stories, newest first
    pub async fn active(&self) -> RepoResult<Vec<StoryView>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.media_url, s.media_type, s.created_at, s.expires_at,
                   u.id AS author_id, u.username AS author_username,
                   u.avatar_url AS author_avatar_url
            FROM stories s JOIN users u ON u.id = s.author_id
            WHERE s.expires_at > now()
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(story_view_from_row).collect()
    }

    /// Publish a story expiring 24 hours from now
    pub async fn create(&self, author_id: Uuid, story: &NewStoryRequest) -> RepoResult<StoryView> {
        let expires_at = Utc::now() + Duration::hours(24);

        let row = sqlx::query(
            r#"
            WITH s AS (
                INSERT INTO stories (author_id, media_url, media_type, expires_at)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT s.id, s.media_url, s.media_type, s.created_at, s.expires_at,
                   u.id AS author_id, u.username AS author_username,
                   u.avatar_url AS author_avatar_url
            FROM s JOIN users u ON u.id = s.author_id
            "#,
        )
        .bind(author_id)
        .bind(&story.media_url)
        .bind(story.media_type.as_str())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        story_view_from_row(&row)
    }
}

fn story_view_from_row(row: &PgRow) -> RepoResult<StoryView> {
    let media_type_raw: String = row.get("media_type");
    let media_type = MediaType::parse(&media_type_raw)
        .ok_or_else(|| RepoError::Decode(format!("media_type {media_type_raw:?}")))?;

    Ok(StoryView {
        id: row.get("id"),
        media_url: row.get("media_url"),
        media_type,
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        author: author_from_row(row),
    })
}
