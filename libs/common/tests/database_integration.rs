//! Integration test for the database infrastructure
//!
//! Requires a reachable PostgreSQL instance addressed by `DATABASE_URL`,
//! so it is ignored by default. Run with `cargo test -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn database_pool_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    health_check(&pool).await?;

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1);

    Ok(())
}
