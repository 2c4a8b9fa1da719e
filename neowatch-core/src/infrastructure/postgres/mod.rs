//! Postgres-backed collaborators.

pub mod queue;
pub mod results;

pub use queue::PostgresMessageQueue;
pub use results::PostgresResultStore;

use sqlx::PgPool;
use tracing::info;

use crate::error::{Result, TrackerError};

async fn health_check(pool: &PgPool, component: &str) -> Result<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            TrackerError::Database(format!(
                "{component} failed Postgres health check: {e}"
            ))
        })?;
    info!("{component} connected to Postgres");
    Ok(())
}
