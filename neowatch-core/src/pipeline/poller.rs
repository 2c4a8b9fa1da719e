use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ports::{MessageQueue, QueueMessage, ReceiveRequest};

/// Long-polls the work queue and forwards every message into the intake.
///
/// Receive errors are logged and retried after a short pause. The poller
/// only stops when shutdown is requested or every worker has gone away.
pub struct IngressPoller {
    queue: Arc<dyn MessageQueue>,
    request: ReceiveRequest,
    intake: mpsc::Sender<QueueMessage>,
    error_backoff: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for IngressPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngressPoller")
            .field("request", &self.request)
            .field("intake_capacity", &self.intake.max_capacity())
            .field("error_backoff", &self.error_backoff)
            .finish()
    }
}

impl IngressPoller {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        request: ReceiveRequest,
        intake: mpsc::Sender<QueueMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            queue,
            request,
            intake,
            error_backoff: Duration::from_secs(1),
            cancel,
        }
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    pub async fn run(self) {
        info!(target: "pipeline::poller", "ingress poller started");
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.queue.receive(self.request) => received,
            };

            match received {
                Ok(batch) => {
                    if !batch.is_empty() {
                        debug!(target: "pipeline::poller", count = batch.len(), "received batch");
                    }
                    if !self.forward(batch).await {
                        break;
                    }
                }
                Err(err) => {
                    warn!(
                        target: "pipeline::poller",
                        error = %err,
                        backoff_ms = self.error_backoff.as_millis() as u64,
                        "queue receive failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }
        info!(target: "pipeline::poller", "ingress poller stopped");
    }

    /// Push a batch into the intake, waiting for free capacity. Returns
    /// `false` once polling should stop.
    async fn forward(&self, batch: Vec<QueueMessage>) -> bool {
        for message in batch {
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                sent = self.intake.send(message) => sent,
            };
            if sent.is_err() {
                info!(target: "pipeline::poller", "intake closed");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{Result, TrackerError};
    use crate::infrastructure::InMemoryQueue;
    use crate::ports::ReceiptHandle;

    /// Fails the first `failures` receives, then hands out one message per call.
    struct FlakyQueue {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MessageQueue for FlakyQueue {
        async fn receive(&self, _request: ReceiveRequest) -> Result<Vec<QueueMessage>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(TrackerError::Queue("connection reset".into()));
            }
            Ok(vec![QueueMessage {
                message_id: call.to_string(),
                body: "{}".into(),
                receipt: ReceiptHandle(format!("r-{call}")),
            }])
        }

        async fn delete(&self, _receipt: &ReceiptHandle) -> Result<()> {
            Ok(())
        }

        async fn enqueue(&self, _body: &str) -> Result<String> {
            Err(TrackerError::Queue("read-only queue".into()))
        }
    }

    fn quick() -> ReceiveRequest {
        ReceiveRequest {
            max_messages: 10,
            wait: Duration::from_millis(20),
            visibility_timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn receive_errors_are_retried() {
        let queue = Arc::new(FlakyQueue {
            failures: 3,
            calls: AtomicUsize::new(0),
        });
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let poller = IngressPoller::new(queue.clone(), quick(), tx, cancel.clone())
            .with_error_backoff(Duration::from_millis(1));
        let handle = tokio::spawn(poller.run());

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.message_id, "3");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn forwards_queue_messages_into_intake() {
        let queue = Arc::new(InMemoryQueue::new());
        for n in 0..3 {
            queue.send(format!("payload-{n}")).await;
        }
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            IngressPoller::new(queue.clone(), quick(), tx, cancel.clone()).run(),
        );

        let mut bodies = Vec::new();
        for _ in 0..3 {
            let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            bodies.push(message.body);
        }
        bodies.sort();
        assert_eq!(bodies, vec!["payload-0", "payload-1", "payload-2"]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn full_intake_stalls_poller_without_dropping_messages() {
        let queue = Arc::new(InMemoryQueue::new());
        let mut ids = Vec::new();
        for n in 0..3 {
            ids.push(queue.send(format!("payload-{n}")).await);
        }
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            IngressPoller::new(queue.clone(), quick(), tx, cancel.clone()).run(),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.len(), 1, "only one message fits in the intake");
        assert!(!handle.is_finished());
        assert_eq!(queue.pending().await, 3);
        for id in &ids {
            // Leased once and still held; the poller has not polled again.
            assert_eq!(queue.receive_count(id).await, Some(1));
        }

        let mut bodies = Vec::new();
        for _ in 0..3 {
            let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            bodies.push(message.body);
        }
        assert_eq!(bodies, vec!["payload-0", "payload-1", "payload-2"]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stops_when_intake_is_closed() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.send("orphan").await;
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let poller = IngressPoller::new(queue, quick(), tx, CancellationToken::new());
        tokio::time::timeout(Duration::from_secs(5), poller.run())
            .await
            .expect("poller exits once the intake is gone");
    }
}
