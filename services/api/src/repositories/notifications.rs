//! Notification repository (read path)
//!
//! Only the read side lives in this service; the actions that produce
//! notification rows are written elsewhere.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::notification::{NotificationActor, NotificationType, NotificationView};
use crate::repositories::{RepoError, RepoResult};

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the recipient's notifications, newest first
    pub async fn for_user(&self, user_id: Uuid) -> RepoResult<Vec<NotificationView>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.type, n.created_at,
                   u.id AS actor_id, u.username AS actor_username
            FROM notifications n JOIN users u ON u.id = n.actor_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let raw: String = row.get("type");
                let kind = NotificationType::parse(&raw)
                    .ok_or_else(|| RepoError::Decode(format!("notification type {raw:?}")))?;

                Ok(NotificationView {
                    id: row.get("id"),
                    kind,
                    created_at: row.get("created_at"),
                    actor: NotificationActor {
                        id: row.get("actor_id"),
                        username: row.get("actor_username"),
                    },
                })
            })
            .collect()
    }
}
