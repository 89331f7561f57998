//! Integration tests for the repository layer
//!
//! Requires a reachable PostgreSQL instance addressed by `DATABASE_URL`,
//! so they are ignored by default. Run with `cargo test -- --ignored`.
//! Each test seeds its own users and posts and asserts through
//! viewer-relative reads, so they tolerate rows left behind by earlier
//! runs and by each other.

use common::database::{DatabaseConfig, init_pool};
use qawafi_api::models::post::{FEED_PAGE_SIZE, NewPostRequest, PoemType, PostView};
use qawafi_api::models::User;
use qawafi_api::repositories::{
    RepoError, UserRepository, posts::PostRepository, social::SocialRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn test_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

async fn seed_user(users: &UserRepository, prefix: &str) -> Result<User, RepoError> {
    let suffix = Uuid::new_v4().simple().to_string();
    users
        .create(&format!("{}_{}", prefix, &suffix[..12]), None, "hunter42")
        .await
}

fn poem(content: &str) -> NewPostRequest {
    NewPostRequest {
        content: content.to_string(),
        title: None,
        poem_type: PoemType::Fusha,
        image_url: None,
        audio_url: None,
        video_url: None,
    }
}

fn ids(items: &[PostView]) -> Vec<Uuid> {
    items.iter().map(|post| post.id).collect()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn feed_cursor_excludes_anchor_and_never_repeats() -> TestResult {
    let pool = test_pool().await?;
    let users = UserRepository::new(pool.clone());
    let posts = PostRepository::new(pool);

    let author = seed_user(&users, "cursor_poet").await?;
    for i in 0..FEED_PAGE_SIZE + 2 {
        posts.create(author.id, &poem(&format!("بيت {}", i))).await?;
    }

    let first = posts
        .feed_page(author.id, None)
        .await?
        .ok_or("first page missing")?;
    assert_eq!(first.items.len(), FEED_PAGE_SIZE);
    let cursor = first.next_cursor.ok_or("full page must carry a cursor")?;
    assert_eq!(cursor, first.items.last().map(|post| post.id).ok_or("empty page")?);

    let second = posts
        .feed_page(author.id, Some(cursor))
        .await?
        .ok_or("known cursor must resolve")?;

    // The anchor itself and everything on page one stays behind the cursor.
    for post in &second.items {
        assert_ne!(post.id, cursor);
        assert!(!ids(&first.items).contains(&post.id));
    }

    // Strictly descending within each page, and page two starts at or
    // before page one's boundary.
    for page in [&first.items, &second.items] {
        for pair in page.windows(2) {
            assert!((pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id));
        }
    }
    let boundary = first.items.last().ok_or("empty page")?;
    if let Some(head) = second.items.first() {
        assert!((head.created_at, head.id) < (boundary.created_at, boundary.id));
    }

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn unknown_cursor_resolves_to_no_page() -> TestResult {
    let pool = test_pool().await?;
    let posts = PostRepository::new(pool);

    let page = posts.feed_page(Uuid::new_v4(), Some(Uuid::new_v4())).await?;
    assert!(page.is_none());

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn liked_flag_is_viewer_relative_and_counts_are_shared() -> TestResult {
    let pool = test_pool().await?;
    let users = UserRepository::new(pool.clone());
    let posts = PostRepository::new(pool.clone());
    let social = SocialRepository::new(pool);

    let author = seed_user(&users, "liked_author").await?;
    let fan = seed_user(&users, "liked_fan").await?;
    let bystander = seed_user(&users, "liked_bystander").await?;

    let post = posts.create(author.id, &poem("قصيدة الإعجاب")).await?;
    social.like(fan.id, post.id).await?;

    let find = |views: Vec<PostView>| {
        views
            .into_iter()
            .find(|view| view.id == post.id)
            .ok_or("post missing from profile")
    };

    let as_fan = find(posts.user_posts(author.id, fan.id, 50).await?)?;
    assert!(as_fan.liked);
    assert_eq!(as_fan.counts.likes, 1);

    let as_bystander = find(posts.user_posts(author.id, bystander.id, 50).await?)?;
    assert!(!as_bystander.liked);
    assert_eq!(as_bystander.counts.likes, 1);

    social.unlike(fan.id, post.id).await?;
    let after_unlike = find(posts.user_posts(author.id, fan.id, 50).await?)?;
    assert!(!after_unlike.liked);
    assert_eq!(after_unlike.counts.likes, 0);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn second_like_conflicts_and_unlike_is_idempotent() -> TestResult {
    let pool = test_pool().await?;
    let users = UserRepository::new(pool.clone());
    let posts = PostRepository::new(pool.clone());
    let social = SocialRepository::new(pool);

    let author = seed_user(&users, "like_author").await?;
    let fan = seed_user(&users, "like_fan").await?;
    let post = posts.create(author.id, &poem("قصيدة")).await?;

    social.like(fan.id, post.id).await?;
    assert!(matches!(
        social.like(fan.id, post.id).await,
        Err(RepoError::Duplicate(_))
    ));

    // Removal succeeds whether or not a row existed.
    social.unlike(fan.id, post.id).await?;
    social.unlike(fan.id, post.id).await?;

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn second_follow_conflicts_and_unfollow_is_idempotent() -> TestResult {
    let pool = test_pool().await?;
    let users = UserRepository::new(pool.clone());
    let social = SocialRepository::new(pool);

    let follower = seed_user(&users, "follow_a").await?;
    let followed = seed_user(&users, "follow_b").await?;

    social.follow(follower.id, followed.id).await?;
    assert!(matches!(
        social.follow(follower.id, followed.id).await,
        Err(RepoError::Duplicate(_))
    ));

    social.unfollow(follower.id, followed.id).await?;
    social.unfollow(follower.id, followed.id).await?;

    // The check constraint backstops the route-level self-follow guard.
    assert!(matches!(
        social.follow(follower.id, follower.id).await,
        Err(RepoError::CheckViolation(_))
    ));

    Ok(())
}
