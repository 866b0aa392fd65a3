use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create the PostgreSQL connection pool. Sized for a small
/// request-serving CRUD API; a saturated pool fails the request after
/// the acquire timeout instead of queueing indefinitely.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(16)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to the places database")
}

/// Apply the embedded user/place schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to migrate the places database")?;
    Ok(())
}
