//! API routes and handlers

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    models::{
        AuthResponse, LoginRequest, RegisterRequest, SuccessResponse, UpdateProfileRequest,
        UserProfile, UserSearchResult, UserSummary,
        post::{NewCommentRequest, NewPostRequest},
        story::NewStoryRequest,
    },
    repositories::RepoError,
    state::AppState,
    validation,
};

/// Default page size for a user's profile posts
const USER_POSTS_DEFAULT_LIMIT: i64 = 20;
/// Upper bound for the profile posts page size
const USER_POSTS_MAX_LIMIT: i64 = 50;

/// Create the router for the Qawafi API
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/feed", get(get_feed))
        .route("/posts", post(create_post))
        .route("/posts/:id/comments", get(get_comments))
        .route("/posts/:id/comments", post(create_comment))
        .route("/posts/:id/like", post(like_post))
        .route("/posts/:id/like", delete(unlike_post))
        .route("/users/search", get(search_users))
        .route("/users/:id/posts", get(get_user_posts))
        .route("/users/:id/follow", post(follow_user))
        .route("/users/:id/follow", delete(unfollow_user))
        .route("/me", get(get_me))
        .route("/me", patch(update_me))
        .route("/upload/presign", get(presign_upload))
        .route("/stories", get(get_stories))
        .route("/stories", post(create_story))
        .route("/notifications", get(get_notifications))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "qawafi-api"
    }))
}

/// Register a new account and return a signed token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;
    if let Some(email) = &payload.email {
        validation::validate_email(email).map_err(ApiError::Validation)?;
    }

    let user = state
        .user_repository
        .create(
            &payload.username,
            payload.email.as_deref(),
            &payload.password,
        )
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => {
                ApiError::Conflict("Username or email already exists".to_string())
            }
            e => {
                error!("Failed to create user: {}", e);
                ApiError::InternalServerError
            }
        })?;

    let token = state.jwt_service.generate_token(user.id).map_err(|e| {
        error!("Failed to generate token: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// Log in with username or email and return a signed token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username_or_email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::Unauthorized)?;

    let password_matches = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::InternalServerError
        })?;

    if !password_matches {
        return Err(ApiError::Unauthorized);
    }

    let token = state.jwt_service.generate_token(user.id).map_err(|e| {
        error!("Failed to generate token: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// Query parameters for the feed
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub cursor: Option<Uuid>,
}

/// Fetch one page of the feed for the requesting user
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .post_repository
        .feed_page(user.id, query.cursor)
        .await
        .map_err(|e| {
            error!("Failed to fetch feed: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::Validation("Unknown cursor".to_string()))?;

    Ok(Json(page))
}

/// Create a post owned by the requesting user
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewPostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .post_repository
        .create(user.id, &payload)
        .await
        .map_err(|e| {
            error!("Failed to create post: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(post))
}

/// Fetch a post's comments, oldest first
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.post_repository.comments(post_id).await.map_err(|e| {
        error!("Failed to fetch comments: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(comments))
}

/// Add a comment to a post
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<NewCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state
        .post_repository
        .create_comment(post_id, user.id, &payload.text)
        .await
    {
        Ok(comment) => Ok(Json(comment)),
        Err(RepoError::MissingReference(_)) => {
            Err(ApiError::NotFound("Post not found".to_string()))
        }
        Err(e) => {
            error!("Failed to create comment: {}", e);
            Err(ApiError::InternalServerError)
        }
    }
}

/// Like a post
pub async fn like_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    match state.social_repository.like(user.id, post_id).await {
        Ok(()) => Ok(Json(SuccessResponse::ok())),
        Err(RepoError::Duplicate(_)) => Err(ApiError::Conflict("Already liked".to_string())),
        Err(RepoError::MissingReference(_)) => {
            Err(ApiError::NotFound("Post not found".to_string()))
        }
        Err(e) => {
            error!("Failed to like post: {}", e);
            Err(ApiError::InternalServerError)
        }
    }
}

/// Remove a like; idempotent
pub async fn unlike_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .social_repository
        .unlike(user.id, post_id)
        .await
        .map_err(|e| {
            error!("Failed to unlike post: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(SuccessResponse::ok()))
}

/// Query parameters for user search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Search users by username substring, annotated with follow state
pub async fn search_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = query.q.unwrap_or_default();
    if q.trim().is_empty() {
        // Empty query never becomes a full listing.
        return Ok(Json(Vec::<UserSearchResult>::new()));
    }

    let results = state
        .social_repository
        .search(user.id, &q)
        .await
        .map_err(|e| {
            error!("Failed to search users: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(results))
}

/// Query parameters for a user's posts
#[derive(Debug, Deserialize)]
pub struct UserPostsQuery {
    pub limit: Option<i64>,
}

/// Fetch a user's published posts, annotated for the viewer
pub async fn get_user_posts(
    State(state): State<AppState>,
    Extension(viewer): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<UserPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .post_repository
        .user_posts(user_id, viewer.id, clamp_limit(query.limit))
        .await
        .map_err(|e| {
            error!("Failed to fetch user posts: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(posts))
}

/// Follow another user
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(target_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if user.id == target_id {
        return Err(ApiError::Validation("Cannot follow yourself".to_string()));
    }

    match state.social_repository.follow(user.id, target_id).await {
        Ok(()) => Ok(Json(SuccessResponse::ok())),
        Err(RepoError::Duplicate(_)) => Err(ApiError::Conflict("Already following".to_string())),
        Err(RepoError::MissingReference(_)) => {
            Err(ApiError::NotFound("User not found".to_string()))
        }
        Err(RepoError::CheckViolation(_)) => {
            Err(ApiError::Validation("Cannot follow yourself".to_string()))
        }
        Err(e) => {
            error!("Failed to follow user: {}", e);
            Err(ApiError::InternalServerError)
        }
    }
}

/// Remove a follow relationship; idempotent
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(target_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .social_repository
        .unfollow(user.id, target_id)
        .await
        .map_err(|e| {
            error!("Failed to unfollow user: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(SuccessResponse::ok()))
}

/// Fetch the requesting user's profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .user_repository
        .find_by_id(user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch profile: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(profile)))
}

/// Apply a partial profile update
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(bio) = &payload.bio {
        validation::validate_bio(bio).map_err(ApiError::Validation)?;
    }
    if let Some(Some(url)) = &payload.avatar_url {
        validation::validate_avatar_url(url).map_err(ApiError::Validation)?;
    }

    let updated = state
        .user_repository
        .update_profile(
            user.id,
            payload.bio.as_deref(),
            payload.avatar_url.as_ref().map(|inner| inner.as_deref()),
        )
        .await
        .map_err(|e| {
            error!("Failed to update profile: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(updated)))
}

/// Query parameters for upload presigning
#[derive(Debug, Deserialize)]
pub struct PresignQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ext: Option<String>,
}

/// Issue a presigned upload URL scoped under the requesting user
pub async fn presign_upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PresignQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let grant = state
        .upload_broker
        .presign(
            user.id,
            query.kind.as_deref().unwrap_or("image"),
            query.ext.as_deref(),
        )
        .await
        .map_err(|e| {
            error!("Failed to presign upload: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(grant))
}

/// Fetch all unexpired stories
pub async fn get_stories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let stories = state.story_repository.active().await.map_err(|e| {
        error!("Failed to fetch stories: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(stories))
}

/// Publish a story
pub async fn create_story(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let story = state
        .story_repository
        .create(user.id, &payload)
        .await
        .map_err(|e| {
            error!("Failed to create story: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(story))
}

/// Fetch the requesting user's notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .notification_repository
        .for_user(user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch notifications: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(notifications))
}

/// Resolve the profile posts page size: absent or non-positive values
/// fall back to 20, anything larger than 50 is capped
fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if l > 0 => l.min(USER_POSTS_MAX_LIMIT),
        _ => USER_POSTS_DEFAULT_LIMIT,
    }
}
