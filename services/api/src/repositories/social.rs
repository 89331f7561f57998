//! Social graph repository: follows, likes, and user search
//!
//! Like and follow share the same toggle semantics: creating a duplicate
//! pair is a conflict (the composite primary key makes exactly one of
//! any concurrent duplicate inserts win), while removal is idempotent
//! delete-many that succeeds whether or not a row existed.

use sqlx::{PgPool, Row};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::UserSearchResult;
use crate::repositories::RepoResult;

/// Maximum number of user search results
pub const SEARCH_RESULT_CAP: i64 = 20;

/// Social graph repository
#[derive(Clone)]
pub struct SocialRepository {
    pool: PgPool,
}

impl SocialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Like a post on behalf of a user
    ///
    /// A second like of the same post surfaces as
    /// [`RepoError::Duplicate`](crate::repositories::RepoError::Duplicate);
    /// a nonexistent post as `MissingReference`.
    pub async fn like(&self, user_id: Uuid, post_id: Uuid) -> RepoResult<()> {
        sqlx::query("INSERT INTO likes (post_id, user_id) VALUES ($1, $2)")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a like; succeeds even if none existed
    pub async fn unlike(&self, user_id: Uuid, post_id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Follow another user
    ///
    /// Mirrors [`like`](Self::like): duplicate pair is a conflict,
    /// missing target a `MissingReference`. Self-follows are rejected at
    /// the route layer and backstopped by a check constraint.
    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<()> {
        sqlx::query("INSERT INTO follows (follower_id, following_id) VALUES ($1, $2)")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a follow relationship; succeeds even if none existed
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<()> {
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Case-insensitive substring search on usernames, capped at 20
    /// results, each annotated with the viewer's follow state
    pub async fn search(&self, viewer_id: Uuid, query: &str) -> RepoResult<Vec<UserSearchResult>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(
            r#"
            SELECT id, username, avatar_url
            FROM users
            WHERE username ILIKE $1 ESCAPE '\'
            ORDER BY username
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(SEARCH_RESULT_CAP)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        let following: HashSet<Uuid> = sqlx::query(
            "SELECT following_id FROM follows WHERE follower_id = $1 AND following_id = ANY($2)",
        )
        .bind(viewer_id)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| row.get("following_id"))
        .collect();

        Ok(rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                UserSearchResult {
                    id,
                    username: row.get("username"),
                    avatar_url: row.get("avatar_url"),
                    is_following: following.contains(&id),
                }
            })
            .collect())
    }
}

/// Escape LIKE metacharacters so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_passes_plain_text_through() {
        assert_eq!(escape_like("qawafi"), "qawafi");
    }

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
