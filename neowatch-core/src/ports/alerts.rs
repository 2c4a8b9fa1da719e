use async_trait::async_trait;

use crate::error::Result;

/// Fan-out notification channel for collision alerts.
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    async fn notify(&self, topic: &str, message: &str) -> Result<()>;
}
