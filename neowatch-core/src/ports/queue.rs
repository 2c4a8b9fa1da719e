use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque token proving the holder leased a message. Only the most recent
/// receipt for a message can delete it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptHandle(pub String);

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message leased from the queue.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
    pub receipt: ReceiptHandle,
}

/// Parameters of one long-poll call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// Upper bound on messages returned by one call.
    pub max_messages: usize,
    /// How long to wait for at least one message before returning empty.
    pub wait: Duration,
    /// How long received messages stay hidden from other consumers.
    pub visibility_timeout: Duration,
}

impl Default for ReceiveRequest {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait: Duration::from_secs(20),
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

/// Work queue with visibility-timeout semantics: a received message that
/// is not deleted before its timeout becomes visible again.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<QueueMessage>>;

    async fn delete(&self, receipt: &ReceiptHandle) -> Result<()>;

    /// Append a payload and return the new message id. The body is stored
    /// as given; consumers validate it when they receive it.
    async fn enqueue(&self, body: &str) -> Result<String>;
}
