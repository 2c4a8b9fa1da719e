//! Alert publishers.

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::ports::AlertPublisher;

/// Publishes alerts to the log. Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertPublisher;

#[async_trait]
impl AlertPublisher for LogAlertPublisher {
    async fn notify(&self, topic: &str, message: &str) -> Result<()> {
        warn!(target: "alerts", topic, "{message}");
        Ok(())
    }
}

#[cfg(feature = "webhook")]
pub use webhook::WebhookAlertPublisher;

#[cfg(feature = "webhook")]
mod webhook {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Serialize;
    use tracing::debug;

    use crate::error::{Result, TrackerError};
    use crate::ports::AlertPublisher;

    #[derive(Serialize)]
    struct AlertBody<'a> {
        topic: &'a str,
        message: &'a str,
    }

    /// POSTs `{"topic", "message"}` to an HTTP endpoint.
    #[derive(Debug, Clone)]
    pub struct WebhookAlertPublisher {
        client: reqwest::Client,
        url: String,
    }

    impl WebhookAlertPublisher {
        pub fn new(url: impl Into<String>) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| {
                    TrackerError::Alert(format!("failed to build http client: {e}"))
                })?;
            Ok(Self::with_client(client, url))
        }

        pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
            Self {
                client,
                url: url.into(),
            }
        }
    }

    #[async_trait]
    impl AlertPublisher for WebhookAlertPublisher {
        async fn notify(&self, topic: &str, message: &str) -> Result<()> {
            let response = self
                .client
                .post(&self.url)
                .json(&AlertBody { topic, message })
                .send()
                .await
                .map_err(|e| TrackerError::Alert(format!("webhook request failed: {e}")))?;

            response.error_for_status_ref().map_err(|e| {
                TrackerError::Alert(format!("webhook rejected alert: {e}"))
            })?;

            debug!(target: "alerts", topic, status = %response.status(), "alert delivered");
            Ok(())
        }
    }
}
