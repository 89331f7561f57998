//! Application state shared across handlers
//!
//! All service handles are constructed once at startup and injected
//! here; handlers never reach for ambient globals.

use crate::jwt::JwtService;
use crate::repositories::{
    UserRepository, notifications::NotificationRepository, posts::PostRepository,
    social::SocialRepository, stories::StoryRepository,
};
use crate::upload::UploadBroker;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub upload_broker: UploadBroker,
    pub user_repository: UserRepository,
    pub post_repository: PostRepository,
    pub social_repository: SocialRepository,
    pub story_repository: StoryRepository,
    pub notification_repository: NotificationRepository,
}
