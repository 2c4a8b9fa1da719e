use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ResultRecord, StoredResult};

/// Durable store of simulation outcomes.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist one outcome. Called exactly once per processed message.
    async fn save_result(&self, record: &ResultRecord) -> Result<()>;

    /// Dangerous results ordered by ascending closest distance.
    async fn dangerous_results(&self, limit: usize) -> Result<Vec<StoredResult>>;
}
