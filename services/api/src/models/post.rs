//! Post, comment, and feed payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of posts returned per feed page
pub const FEED_PAGE_SIZE: usize = 10;

/// Poem category tag attached to every post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoemType {
    /// Classical Arabic poetry
    Fusha,
    /// Vernacular (Nabati) poetry
    Nabati,
}

impl PoemType {
    pub fn as_str(self) -> &'static str {
        match self {
            PoemType::Fusha => "FUSHA",
            PoemType::Nabati => "NABATI",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FUSHA" => Some(PoemType::Fusha),
            "NABATI" => Some(PoemType::Nabati),
            _ => None,
        }
    }
}

/// Request for creating a post
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostRequest {
    pub content: String,
    pub title: Option<String>,
    pub poem_type: PoemType,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
}

/// Author identity embedded in post, comment, and story payloads
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Like and comment counts for a post
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PostCounts {
    pub likes: i64,
    pub comments: i64,
}

/// A post annotated with viewer-relative state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub poem_type: PoemType,
    pub created_at: DateTime<Utc>,
    pub author: PostAuthor,
    pub counts: PostCounts,
    /// Whether the requesting user has liked this post
    pub liked: bool,
}

/// One page of the feed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<PostView>,
    pub next_cursor: Option<Uuid>,
}

/// Compute the cursor for the page following `items`.
///
/// A full page signals that more data may exist, so the last item's id
/// becomes the cursor; a partial page ends the feed. When the table ends
/// exactly on a page boundary this yields one extra round trip that
/// returns an empty page.
pub fn next_cursor(items: &[PostView]) -> Option<Uuid> {
    if items.len() == FEED_PAGE_SIZE {
        items.last().map(|post| post.id)
    } else {
        None
    }
}

/// Request for creating a comment
#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub text: String,
}

/// A comment with its author embedded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: PostAuthor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: Uuid) -> PostView {
        PostView {
            id,
            content: "قصيدة".to_string(),
            title: None,
            image_url: None,
            audio_url: None,
            video_url: None,
            poem_type: PoemType::Fusha,
            created_at: Utc::now(),
            author: PostAuthor {
                id: Uuid::new_v4(),
                username: "poet".to_string(),
                avatar_url: None,
            },
            counts: PostCounts {
                likes: 0,
                comments: 0,
            },
            liked: false,
        }
    }

    #[test]
    fn full_page_yields_last_id_as_cursor() {
        let items: Vec<PostView> = (0..FEED_PAGE_SIZE).map(|_| post(Uuid::new_v4())).collect();
        assert_eq!(next_cursor(&items), Some(items.last().unwrap().id));
    }

    #[test]
    fn partial_page_ends_the_feed() {
        let items: Vec<PostView> = (0..FEED_PAGE_SIZE - 1)
            .map(|_| post(Uuid::new_v4()))
            .collect();
        assert_eq!(next_cursor(&items), None);
    }

    #[test]
    fn empty_page_ends_the_feed() {
        assert_eq!(next_cursor(&[]), None);
    }

    #[test]
    fn poem_type_round_trips_through_db_text() {
        for poem_type in [PoemType::Fusha, PoemType::Nabati] {
            assert_eq!(PoemType::parse(poem_type.as_str()), Some(poem_type));
        }
        assert_eq!(PoemType::parse("HAIKU"), None);
    }

    #[test]
    fn poem_type_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&PoemType::Fusha).unwrap(),
            "\"FUSHA\""
        );
    }

    #[test]
    fn post_view_serializes_camel_case() {
        let value = serde_json::to_value(post(Uuid::new_v4())).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("poemType").is_some());
        assert!(value["counts"].get("likes").is_some());
        assert!(value["author"].get("avatarUrl").is_some());
    }
}
