//! Post and comment repository, including the cursor-paginated feed
//!
//! Feed ordering is `created_at DESC, id DESC`; the id tie-break makes
//! the cursor deterministic when several posts share a timestamp.
//! Viewer-relative annotation (liked flag, like and comment counts) is
//! computed in the same query as the page itself. The annotation
//! subqueries are not isolated from concurrent writes; a like landing
//! mid-request may show transiently inconsistent counts, which is
//! accepted.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::post::{
    CommentView, FEED_PAGE_SIZE, FeedPage, NewPostRequest, PoemType, PostAuthor, PostCounts,
    PostView, next_cursor,
};
use crate::repositories::{RepoError, RepoResult};

/// Columns every post query selects, with author and viewer annotation.
const POST_VIEW_COLUMNS: &str = r#"
    p.id, p.content, p.title, p.image_url, p.audio_url, p.video_url,
    p.poem_type, p.created_at,
    u.id AS author_id, u.username AS author_username, u.avatar_url AS author_avatar_url,
    (SELECT count(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
    (SELECT count(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
    EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked
"#;

/// Post repository
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a post owned by `author_id`
    pub async fn create(&self, author_id: Uuid, post: &NewPostRequest) -> RepoResult<PostView> {
        let row = sqlx::query(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (author_id, content, title, image_url, audio_url, video_url, poem_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {POST_VIEW_COLUMNS}
            FROM p JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(author_id)
        .bind(&post.content)
        .bind(&post.title)
        .bind(&post.image_url)
        .bind(&post.audio_url)
        .bind(&post.video_url)
        .bind(post.poem_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        post_view_from_row(&row)
    }

    /// Fetch one feed page for `viewer_id`
    ///
    /// With a cursor the page starts strictly after the cursor post in
    /// feed order; the cursor post itself is excluded. Returns `None`
    /// when the cursor does not name an existing post.
    pub async fn feed_page(
        &self,
        viewer_id: Uuid,
        cursor: Option<Uuid>,
    ) -> RepoResult<Option<FeedPage>> {
        let anchor = match cursor {
            Some(cursor_id) => {
                let row = sqlx::query("SELECT created_at, id FROM posts WHERE id = $1")
                    .bind(cursor_id)
                    .fetch_optional(&self.pool)
                    .await?;
                match row {
                    Some(row) => Some((
                        row.get::<DateTime<Utc>, _>("created_at"),
                        row.get::<Uuid, _>("id"),
                    )),
                    None => return Ok(None),
                }
            }
            None => None,
        };

        let (anchor_created_at, anchor_id) = anchor.unzip();

        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_VIEW_COLUMNS}
            FROM posts p JOIN users u ON u.id = p.author_id
            WHERE $2::timestamptz IS NULL
               OR (p.created_at, p.id) < ($2::timestamptz, $3::uuid)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $4
            "#
        ))
        .bind(viewer_id)
        .bind(anchor_created_at)
        .bind(anchor_id)
        .bind(FEED_PAGE_SIZE as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(post_view_from_row)
            .collect::<RepoResult<Vec<_>>>()?;

        let next_cursor = next_cursor(&items);
        Ok(Some(FeedPage { items, next_cursor }))
    }

    /// Fetch the published posts of one author, newest first
    ///
    /// `limit` is the already-clamped page size; there is no cursor on
    /// this path.
    pub async fn user_posts(
        &self,
        author_id: Uuid,
        viewer_id: Uuid,
        limit: i64,
    ) -> RepoResult<Vec<PostView>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_VIEW_COLUMNS}
            FROM posts p JOIN users u ON u.id = p.author_id
            WHERE p.author_id = $2 AND p.published
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3
            "#
        ))
        .bind(viewer_id)
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_view_from_row).collect()
    }

    /// Fetch a post's comments in display order (oldest first)
    pub async fn comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.post_id, c.text, c.created_at,
                   u.id AS author_id, u.username AS author_username,
                   u.avatar_url AS author_avatar_url
            FROM comments c JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(comment_view_from_row).collect())
    }

    /// Add a comment to a post
    ///
    /// Commenting on a nonexistent post surfaces as
    /// [`RepoError::MissingReference`].
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> RepoResult<CommentView> {
        let row = sqlx::query(
            r#"
            WITH c AS (
                INSERT INTO comments (post_id, user_id, text)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT c.id, c.post_id, c.text, c.created_at,
                   u.id AS author_id, u.username AS author_username,
                   u.avatar_url AS author_avatar_url
            FROM c JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment_view_from_row(&row))
    }
}

fn post_view_from_row(row: &PgRow) -> RepoResult<PostView> {
    let poem_type_raw: String = row.get("poem_type");
    let poem_type = PoemType::parse(&poem_type_raw)
        .ok_or_else(|| RepoError::Decode(format!("poem_type {poem_type_raw:?}")))?;

    Ok(PostView {
        id: row.get("id"),
        content: row.get("content"),
        title: row.get("title"),
        image_url: row.get("image_url"),
        audio_url: row.get("audio_url"),
        video_url: row.get("video_url"),
        poem_type,
        created_at: row.get("created_at"),
        author: author_from_row(row),
        counts: PostCounts {
            likes: row.get("like_count"),
            comments: row.get("comment_count"),
        },
        liked: row.get("liked"),
    })
}

fn comment_view_from_row(row: &PgRow) -> CommentView {
    CommentView {
        id: row.get("id"),
        post_id: row.get("post_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
        author: author_from_row(row),
    }
}

pub(crate) fn author_from_row(row: &PgRow) -> PostAuthor {
    PostAuthor {
        id: row.get("author_id"),
        username: row.get("author_username"),
        avatar_url: row.get("author_avatar_url"),
    }
}
