//! API models for request and response payloads
//!
//! All wire types serialize with camelCase field names, matching the
//! mobile client's expectations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod notification;
pub mod post;
pub mod story;

/// User entity as stored in the database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

/// Request for user login
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Token plus the minimal user identity returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Minimal public identity of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Full profile of the authenticated user, password hash excluded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

/// Request for profile updates
///
/// `avatar_url` distinguishes "absent" from an explicit `null`: the outer
/// `Option` is `None` when the field was omitted, `Some(None)` when the
/// client cleared the avatar.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

/// Deserialize a field where an explicit `null` must stay observable:
/// an absent field becomes `None` (via `default`), while any present
/// value, including `null`, becomes `Some(inner)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Search result entry annotated with the viewer's follow state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub is_following: bool,
}

/// Generic `{"success": true}` body for toggle endpoints
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_distinguishes_null_from_absent() {
        let absent: UpdateProfileRequest = serde_json::from_str(r#"{"bio": "شاعر"}"#).unwrap();
        assert_eq!(absent.bio.as_deref(), Some("شاعر"));
        assert_eq!(absent.avatar_url, None);

        let cleared: UpdateProfileRequest =
            serde_json::from_str(r#"{"avatarUrl": null}"#).unwrap();
        assert_eq!(cleared.avatar_url, Some(None));

        let set: UpdateProfileRequest =
            serde_json::from_str(r#"{"avatarUrl": "https://cdn.example/a.jpg"}"#).unwrap();
        assert_eq!(
            set.avatar_url,
            Some(Some("https://cdn.example/a.jpg".to_string()))
        );
    }

    #[test]
    fn user_profile_excludes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "poet".to_string(),
            email: None,
            password_hash: "secret-hash".to_string(),
            bio: None,
            avatar_url: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["username"], "poet");
    }
}
