use std::time::Duration;

use crate::orbit::SearchParams;
use crate::ports::ReceiveRequest;

/// Topic used for collision alerts when none is configured.
pub const DEFAULT_ALERT_TOPIC: &str = "asteroid-impact-alerts";

/// Tunables for the worker pool and the ingress poller.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Number of concurrent workers draining the intake.
    pub workers: usize,
    /// Capacity of the bounded intake channel. A full intake stalls the
    /// poller until a worker frees a slot.
    pub intake_capacity: usize,
    /// Parameters of every long-poll call.
    pub receive: ReceiveRequest,
    /// Pause after a failed receive before polling again.
    pub poll_error_backoff: Duration,
    pub alert_topic: String,
    pub search: SearchParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            intake_capacity: 64,
            receive: ReceiveRequest::default(),
            poll_error_backoff: Duration::from_secs(1),
            alert_topic: DEFAULT_ALERT_TOPIC.to_string(),
            search: SearchParams::default(),
        }
    }
}
