use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{Result, TrackerError};
use crate::ports::ResultStore;
use crate::types::{ResultRecord, StoredResult};

/// Result store backed by the `simulation_results` table.
#[derive(Clone)]
pub struct PostgresResultStore {
    pool: PgPool,
}

impl PostgresResultStore {
    pub async fn new(pool: PgPool) -> Result<Self> {
        super::health_check(&pool, "Result store").await?;
        Ok(Self { pool })
    }
}

impl fmt::Debug for PostgresResultStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresResultStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl ResultStore for PostgresResultStore {
    async fn save_result(&self, record: &ResultRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO simulation_results
                (asteroid_id, name, closest_distance_km, impact_date, is_dangerous)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.asteroid_id)
        .bind(&record.name)
        .bind(record.closest_distance_km)
        .bind(record.impact_date)
        .bind(record.is_dangerous)
        .execute(&self.pool)
        .await
        .map_err(|e| TrackerError::Database(format!("failed to save result: {e}")))?;
        Ok(())
    }

    async fn dangerous_results(&self, limit: usize) -> Result<Vec<StoredResult>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        sqlx::query_as::<_, StoredResult>(
            r#"
            SELECT id, asteroid_id, name, closest_distance_km, impact_date,
                   is_dangerous, created_at
            FROM simulation_results
            WHERE is_dangerous
            ORDER BY closest_distance_km ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            TrackerError::Database(format!("failed to load dangerous results: {e}"))
        })
    }
}
