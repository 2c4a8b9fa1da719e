use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::time::Instant;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::ports::{MessageQueue, QueueMessage, ReceiptHandle, ReceiveRequest};

/// Work queue stored in the `asteroid_messages` table.
///
/// A receive leases visible rows by pushing their `visible_at` forward and
/// stamping a fresh receipt; a lease that is not deleted in time simply
/// becomes visible again. Rows received `max_receives` times are parked in
/// the `dead_letter` state instead of being handed out again.
#[derive(Clone)]
pub struct PostgresMessageQueue {
    pool: PgPool,
    max_receives: i32,
    poll_interval: Duration,
}

impl fmt::Debug for PostgresMessageQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresMessageQueue")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_receives", &self.max_receives)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl PostgresMessageQueue {
    /// Connect to an existing pool and verify it is reachable.
    pub async fn new(pool: PgPool, max_receives: u32) -> Result<Self> {
        super::health_check(&pool, "Message queue").await?;
        Ok(Self {
            pool,
            max_receives: i32::try_from(max_receives).unwrap_or(i32::MAX),
            poll_interval: Duration::from_millis(500),
        })
    }

    /// How often a waiting receive re-checks the table.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Enqueue a payload. Returns the message id.
    pub async fn send(&self, body: &str) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO asteroid_messages (id, body) VALUES ($1, $2)")
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|e| TrackerError::Queue(format!("enqueue failed: {e}")))?;
        Ok(id)
    }

    /// Number of messages parked as poison.
    pub async fn dead_letter_count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::bigint FROM asteroid_messages WHERE state = 'dead_letter'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TrackerError::Queue(format!("dead letter count failed: {e}")))
    }

    async fn dead_letter_exhausted(&self) -> Result<u64> {
        let parked = sqlx::query(
            r#"
            UPDATE asteroid_messages
            SET state = 'dead_letter',
                receipt = NULL,
                updated_at = NOW()
            WHERE state = 'ready'
              AND visible_at <= NOW()
              AND receive_count >= $1
            "#,
        )
        .bind(self.max_receives)
        .execute(&self.pool)
        .await
        .map_err(|e| TrackerError::Queue(format!("dead letter sweep failed: {e}")))?
        .rows_affected();

        if parked > 0 {
            warn!(
                target: "queue::postgres",
                parked,
                max_receives = self.max_receives,
                "moved exhausted messages to dead letter"
            );
        }
        Ok(parked)
    }

    async fn lease_visible(&self, request: &ReceiveRequest) -> Result<Vec<QueueMessage>> {
        self.dead_letter_exhausted().await?;

        let limit = i64::try_from(request.max_messages).unwrap_or(i64::MAX);
        let visibility_ms =
            i64::try_from(request.visibility_timeout.as_millis()).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            r#"
            WITH next AS (
                SELECT id
                FROM asteroid_messages
                WHERE state = 'ready'
                  AND visible_at <= NOW()
                ORDER BY visible_at, created_at
                FOR UPDATE SKIP LOCKED
                LIMIT $1
            )
            UPDATE asteroid_messages m
            SET receipt = gen_random_uuid(),
                receive_count = m.receive_count + 1,
                visible_at = NOW() + ($2::bigint) * INTERVAL '1 millisecond',
                updated_at = NOW()
            FROM next
            WHERE m.id = next.id
            RETURNING m.id, m.body, m.receipt
            "#,
        )
        .bind(limit)
        .bind(visibility_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TrackerError::Queue(format!("receive failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, body, receipt)| QueueMessage {
                message_id: id.to_string(),
                body,
                receipt: ReceiptHandle(receipt.to_string()),
            })
            .collect())
    }
}

#[async_trait]
impl MessageQueue for PostgresMessageQueue {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<QueueMessage>> {
        let deadline = Instant::now() + request.wait;
        loop {
            let batch = self.lease_visible(&request).await?;
            let now = Instant::now();
            if !batch.is_empty() || now >= deadline {
                trace!(target: "queue::postgres", received = batch.len(), "receive finished");
                return Ok(batch);
            }
            tokio::time::sleep((deadline - now).min(self.poll_interval)).await;
        }
    }

    async fn delete(&self, receipt: &ReceiptHandle) -> Result<()> {
        let receipt_id = Uuid::parse_str(&receipt.0).map_err(|e| {
            TrackerError::Queue(format!("malformed receipt {receipt}: {e}"))
        })?;

        let deleted = sqlx::query("DELETE FROM asteroid_messages WHERE receipt = $1")
            .bind(receipt_id)
            .execute(&self.pool)
            .await
            .map_err(|e| TrackerError::Queue(format!("delete failed: {e}")))?
            .rows_affected();

        if deleted == 0 {
            return Err(TrackerError::Queue(format!(
                "receipt {receipt} is not current"
            )));
        }
        Ok(())
    }

    async fn enqueue(&self, body: &str) -> Result<String> {
        self.send(body).await.map(|id| id.to_string())
    }
}
