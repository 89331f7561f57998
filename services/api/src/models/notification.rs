//! Notification payloads (read-only surface)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of action produced a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
}

impl NotificationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LIKE" => Some(NotificationType::Like),
            "COMMENT" => Some(NotificationType::Comment),
            "FOLLOW" => Some(NotificationType::Follow),
            _ => None,
        }
    }
}

/// The user whose action triggered a notification
#[derive(Debug, Clone, Serialize)]
pub struct NotificationActor {
    pub id: Uuid,
    pub username: String,
}

/// A notification addressed to the requesting user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub created_at: DateTime<Utc>,
    pub actor: NotificationActor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_type() {
        let view = NotificationView {
            id: Uuid::new_v4(),
            kind: NotificationType::Follow,
            created_at: Utc::now(),
            actor: NotificationActor {
                id: Uuid::new_v4(),
                username: "poet".to_string(),
            },
        };
        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["type"], "FOLLOW");
    }
}
