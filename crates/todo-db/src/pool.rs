//! Database connection pool

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Database connection pool type alias
pub type DbPool = PgPool;

/// Bounds for the connection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub min_conns: u32,
    pub max_conns: u32,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_conns: 1,
            max_conns: 10,
        }
    }
}

/// Create a new database connection pool with default bounds
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    create_pool_with_options(database_url, PoolOptions::default()).await
}

/// Create a new database connection pool
pub async fn create_pool_with_options(
    database_url: &str,
    options: PoolOptions,
) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(options.min_conns)
        .max_connections(options.max_conns)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!(
        min_conns = options.min_conns,
        max_conns = options.max_conns,
        "Database pool ready"
    );

    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
