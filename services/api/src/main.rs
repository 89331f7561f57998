use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, health_check, init_pool};
use common::error::DatabaseError;

use qawafi_api::{
    jwt::{JwtConfig, JwtService},
    repositories::{
        UserRepository, notifications::NotificationRepository, posts::PostRepository,
        social::SocialRepository, stories::StoryRepository,
    },
    routes,
    state::AppState,
    upload::{S3Config, UploadBroker},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Qawafi API");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    health_check(&pool).await?;
    info!("Database connection successful");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");

    // Initialize services
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(&jwt_config);

    let s3_config = S3Config::from_env()?;
    let upload_broker = UploadBroker::new(&s3_config).await;

    let app_state = AppState {
        jwt_service,
        upload_broker,
        user_repository: UserRepository::new(pool.clone()),
        post_repository: PostRepository::new(pool.clone()),
        social_repository: SocialRepository::new(pool.clone()),
        story_repository: StoryRepository::new(pool.clone()),
        notification_repository: NotificationRepository::new(pool),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr =
        std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Qawafi API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
