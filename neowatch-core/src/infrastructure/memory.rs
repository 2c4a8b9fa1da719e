//! In-memory collaborator implementations.
//!
//! Used by tests and by the server's `--in-memory` mode. Each fake can be
//! told to fail so error paths can be exercised.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::ports::{
    AlertPublisher, MessageQueue, QueueMessage, ReceiptHandle, ReceiveRequest,
    ResultStore,
};
use crate::types::{ResultRecord, StoredResult};

/// Longest a waiting receive sleeps before re-checking for messages whose
/// visibility timeout lapsed.
const RECHECK_INTERVAL: Duration = Duration::from_millis(25);

/// How many deleted and dead-lettered ids are remembered for inspection.
const LEDGER_LIMIT: usize = 1024;

#[derive(Debug)]
struct StoredMessage {
    id: String,
    body: String,
    receipt: Option<ReceiptHandle>,
    visible_at: Instant,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: Vec<StoredMessage>,
    deleted: VecDeque<String>,
    dead_letters: VecDeque<String>,
    dead_letter_total: u64,
}

fn remember(ledger: &mut VecDeque<String>, id: String) {
    if ledger.len() == LEDGER_LIMIT {
        ledger.pop_front();
    }
    ledger.push_back(id);
}

/// Queue with visibility timeouts kept entirely in process memory.
///
/// With [`InMemoryQueue::with_max_receives`] a message whose lease lapses
/// after that many deliveries is dropped into the dead-letter ledger instead
/// of being handed out again.
#[derive(Default)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    arrivals: Notify,
    max_receives: Option<u32>,
    fail_receives: AtomicBool,
    fail_deletes: AtomicBool,
}

impl fmt::Debug for InMemoryQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("InMemoryQueue");
        debug.field("max_receives", &self.max_receives);
        match self.state.try_lock() {
            Ok(state) => {
                debug
                    .field("pending", &state.messages.len())
                    .field("dead_letters", &state.dead_letter_total);
            }
            Err(_) => {
                debug.field("state", &"<locked>");
            }
        }
        debug.finish()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_receives(mut self, max_receives: u32) -> Self {
        self.max_receives = Some(max_receives.max(1));
        self
    }

    /// Enqueue a payload and return its message id.
    pub async fn send(&self, body: impl Into<String>) -> String {
        let id = Uuid::now_v7().to_string();
        self.state.lock().await.messages.push(StoredMessage {
            id: id.clone(),
            body: body.into(),
            receipt: None,
            visible_at: Instant::now(),
            receive_count: 0,
        });
        self.arrivals.notify_one();
        id
    }

    /// Messages still in the queue, visible or not.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    /// Ids of recently deleted messages in deletion order. Only the last
    /// 1024 are kept.
    pub async fn deleted(&self) -> Vec<String> {
        self.state.lock().await.deleted.iter().cloned().collect()
    }

    /// Ids of recently dead-lettered messages, oldest first.
    pub async fn dead_letters(&self) -> Vec<String> {
        self.state.lock().await.dead_letters.iter().cloned().collect()
    }

    /// Messages dead-lettered since the queue was created.
    pub async fn dead_letter_count(&self) -> u64 {
        self.state.lock().await.dead_letter_total
    }

    /// How many times the message has been handed out.
    pub async fn receive_count(&self, message_id: &str) -> Option<u32> {
        self.state
            .lock()
            .await
            .messages
            .iter()
            .find(|message| message.id == message_id)
            .map(|message| message.receive_count)
    }

    pub fn fail_receives(&self, fail: bool) {
        self.fail_receives.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn dead_letter_exhausted(&self, state: &mut QueueState, now: Instant) {
        let Some(max_receives) = self.max_receives else {
            return;
        };

        let (exhausted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.messages)
            .into_iter()
            .partition(|message| {
                message.visible_at <= now && message.receive_count >= max_receives
            });
        state.messages = kept;

        if exhausted.is_empty() {
            return;
        }
        warn!(
            target: "queue::memory",
            parked = exhausted.len(),
            max_receives,
            "moved exhausted messages to dead letter"
        );
        for message in exhausted {
            state.dead_letter_total += 1;
            remember(&mut state.dead_letters, message.id);
        }
    }

    async fn take_visible(&self, request: &ReceiveRequest) -> Vec<QueueMessage> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        self.dead_letter_exhausted(&mut state, now);

        let mut batch = Vec::new();
        for message in state.messages.iter_mut() {
            if batch.len() >= request.max_messages {
                break;
            }
            if message.visible_at > now {
                continue;
            }

            let receipt = ReceiptHandle(Uuid::new_v4().to_string());
            message.receipt = Some(receipt.clone());
            message.visible_at = now + request.visibility_timeout;
            message.receive_count += 1;

            batch.push(QueueMessage {
                message_id: message.id.clone(),
                body: message.body.clone(),
                receipt,
            });
        }

        batch
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<QueueMessage>> {
        if self.fail_receives.load(Ordering::SeqCst) {
            return Err(TrackerError::Queue("injected receive failure".into()));
        }

        let deadline = Instant::now() + request.wait;
        loop {
            let batch = self.take_visible(&request).await;
            let now = Instant::now();
            if !batch.is_empty() || now >= deadline {
                return Ok(batch);
            }

            let pause = (deadline - now).min(RECHECK_INTERVAL);
            tokio::select! {
                _ = self.arrivals.notified() => {}
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    async fn delete(&self, receipt: &ReceiptHandle) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TrackerError::Queue("injected delete failure".into()));
        }

        let mut state = self.state.lock().await;
        let position = state
            .messages
            .iter()
            .position(|message| message.receipt.as_ref() == Some(receipt))
            .ok_or_else(|| {
                TrackerError::Queue(format!("receipt {receipt} is not current"))
            })?;

        let message = state.messages.remove(position);
        remember(&mut state.deleted, message.id);
        Ok(())
    }

    async fn enqueue(&self, body: &str) -> Result<String> {
        Ok(self.send(body).await)
    }
}

/// Alert publisher that records every notification.
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(topic, message)` pairs delivered so far.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertPublisher for RecordingAlerts {
    async fn notify(&self, topic: &str, message: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackerError::Alert("injected alert failure".into()));
        }
        self.sent
            .lock()
            .await
            .push((topic.to_string(), message.to_string()));
        Ok(())
    }
}

/// Result store kept in a vector.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    rows: Mutex<Vec<StoredResult>>,
    fail: AtomicBool,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<StoredResult> {
        self.rows.lock().await.clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save_result(&self, record: &ResultRecord) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackerError::Database("injected save failure".into()));
        }

        let mut rows = self.rows.lock().await;
        let id = rows.len() as i64 + 1;
        rows.push(StoredResult {
            id,
            asteroid_id: record.asteroid_id.clone(),
            name: record.name.clone(),
            closest_distance_km: record.closest_distance_km,
            impact_date: record.impact_date,
            is_dangerous: record.is_dangerous,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn dangerous_results(&self, limit: usize) -> Result<Vec<StoredResult>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackerError::Database("injected query failure".into()));
        }

        let mut dangerous: Vec<StoredResult> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| row.is_dangerous)
            .cloned()
            .collect();
        dangerous.sort_by(|a, b| {
            a.closest_distance_km.total_cmp(&b.closest_distance_km)
        });
        dangerous.truncate(limit);
        Ok(dangerous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(visibility_ms: u64) -> ReceiveRequest {
        ReceiveRequest {
            max_messages: 10,
            wait: Duration::from_millis(0),
            visibility_timeout: Duration::from_millis(visibility_ms),
        }
    }

    #[tokio::test]
    async fn received_message_is_hidden_until_timeout() {
        let queue = InMemoryQueue::new();
        let id = queue.send("payload").await;

        let first = queue.receive(quick(60_000)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].message_id, id);

        let hidden = queue.receive(quick(60_000)).await.unwrap();
        assert!(hidden.is_empty());
    }

    #[tokio::test]
    async fn expired_lease_is_redelivered_with_new_receipt() {
        let queue = InMemoryQueue::new();
        let id = queue.send("payload").await;

        let first = queue.receive(quick(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = queue.receive(quick(10)).await.unwrap();

        assert_eq!(second.len(), 1);
        assert_ne!(first[0].receipt, second[0].receipt);
        assert_eq!(queue.receive_count(&id).await, Some(2));

        // The stale receipt no longer deletes the message.
        assert!(queue.delete(&first[0].receipt).await.is_err());
        queue.delete(&second[0].receipt).await.unwrap();
        assert_eq!(queue.deleted().await, vec![id]);
    }

    #[tokio::test]
    async fn exhausted_messages_are_dead_lettered() {
        let queue = InMemoryQueue::new().with_max_receives(2);
        let first = queue.send("poison-a").await;
        let second = queue.send("poison-b").await;

        for _ in 0..2 {
            let batch = queue.receive(quick(5)).await.unwrap();
            assert_eq!(batch.len(), 2);
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        // Both reached the limit, so neither is handed out a third time.
        assert!(queue.receive(quick(5)).await.unwrap().is_empty());

        assert_eq!(queue.pending().await, 0);
        assert_eq!(queue.dead_letter_count().await, 2);
        assert_eq!(queue.dead_letters().await, vec![first, second]);
    }

    #[tokio::test]
    async fn message_deleted_before_limit_is_not_dead_lettered() {
        let queue = InMemoryQueue::new().with_max_receives(1);
        queue.send("once").await;

        let batch = queue.receive(quick(5)).await.unwrap();
        queue.delete(&batch[0].receipt).await.unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;

        assert!(queue.receive(quick(5)).await.unwrap().is_empty());
        assert_eq!(queue.dead_letter_count().await, 0);
        assert_eq!(queue.deleted().await.len(), 1);
    }

    #[tokio::test]
    async fn deletion_ledger_is_capped() {
        let queue = InMemoryQueue::new();
        for n in 0..(LEDGER_LIMIT + 10) {
            queue.send(format!("m{n}")).await;
        }

        let request = ReceiveRequest {
            max_messages: LEDGER_LIMIT + 10,
            wait: Duration::ZERO,
            visibility_timeout: Duration::from_secs(60),
        };
        let batch = queue.receive(request).await.unwrap();
        let last = batch.last().unwrap().message_id.clone();
        for message in &batch {
            queue.delete(&message.receipt).await.unwrap();
        }

        let deleted = queue.deleted().await;
        assert_eq!(deleted.len(), LEDGER_LIMIT);
        assert_eq!(deleted.last(), Some(&last));
        assert_eq!(queue.pending().await, 0);
    }

    #[tokio::test]
    async fn enqueue_through_the_port_is_receivable() {
        let queue: std::sync::Arc<dyn MessageQueue> =
            std::sync::Arc::new(InMemoryQueue::new());
        let id = queue.enqueue("{}").await.unwrap();

        let batch = queue.receive(quick(1_000)).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].message_id, id);
    }

    #[tokio::test]
    async fn long_poll_wakes_on_arrival() {
        let queue = std::sync::Arc::new(InMemoryQueue::new());
        let producer = std::sync::Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.send("late").await;
        });

        let request = ReceiveRequest {
            max_messages: 1,
            wait: Duration::from_secs(5),
            visibility_timeout: Duration::from_secs(30),
        };
        let batch = queue.receive(request).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "late");
    }

    #[tokio::test]
    async fn dangerous_results_are_sorted_and_limited() {
        let store = InMemoryResultStore::new();
        for (id, distance, dangerous) in [
            ("a", 5_500.0, true),
            ("b", 1_200.0, true),
            ("c", 9.0e7, false),
            ("d", 3_000.0, true),
        ] {
            store
                .save_result(&ResultRecord {
                    asteroid_id: id.into(),
                    name: id.into(),
                    closest_distance_km: distance,
                    impact_date: 2_460_000.0,
                    is_dangerous: dangerous,
                })
                .await
                .unwrap();
        }

        let top = store.dangerous_results(2).await.unwrap();
        let ids: Vec<_> = top.iter().map(|row| row.asteroid_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
    }
}
