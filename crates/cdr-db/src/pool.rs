//! PostgreSQL connection pool management

use cdr_core::{AppError, AppResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// Connection timeout in seconds
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Idle timeout in seconds
const IDLE_TIMEOUT_SECS: u64 = 600;

/// Create a PostgreSQL connection pool and verify it answers
///
/// # Example
///
/// ```no_run
/// use cdr_db::create_pool;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool("postgresql://localhost/cdr_ingest", 5).await?;
///     Ok(())
/// }
/// ```
pub async fn create_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    info!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .idle_timeout(Some(Duration::from_secs(IDLE_TIMEOUT_SECS)))
        .test_before_acquire(true)
        .connect(database_url)
        .await
        .map_err(|e| {
            warn!("Failed to create database pool: {}", e);
            AppError::Pool(format!("Failed to connect to database: {}", e))
        })?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::Database(format!("Database health check failed: {}", e)))?;

    info!(
        "Database connection verified ({} max connections)",
        max_connections
    );

    Ok(pool)
}
