//! Story payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::post::PostAuthor;

/// Kind of media attached to a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IMAGE" => Some(MediaType::Image),
            "VIDEO" => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// Request for publishing a story
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoryRequest {
    pub media_url: String,
    pub media_type: MediaType,
}

/// A story with its author embedded
///
/// Stories are visible for 24 hours after creation; expired rows are
/// filtered on read, never deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    pub id: Uuid,
    pub media_url: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub author: PostAuthor,
}
