//! NASA NeoWs HTTP client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::ingest::{parse_feed, parse_orbital_data};
use crate::ports::{FeedObject, NeoFeed};

/// Reads the `/feed` and `/neo/{id}` endpoints.
#[derive(Clone)]
pub struct NeoWsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for NeoWsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeoWsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl NeoWsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TrackerError::Feed(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TrackerError::Feed(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        let response = response
            .error_for_status()
            .map_err(|e| TrackerError::Feed(format!("{path} returned {status}: {e}")))?;

        debug!(target: "ingest::neows", path, %status, "feed response received");
        response
            .text()
            .await
            .map_err(|e| TrackerError::Feed(format!("reading {path} failed: {e}")))
    }
}

#[async_trait]
impl NeoFeed for NeoWsClient {
    async fn objects_on(&self, date: NaiveDate) -> Result<Vec<FeedObject>> {
        let day = date.format("%Y-%m-%d").to_string();
        let body = self
            .get("feed", &[("start_date", day.as_str()), ("end_date", day.as_str())])
            .await?;
        parse_feed(&body, date)
    }

    async fn orbital_data(&self, asteroid_id: &str) -> Result<Value> {
        let body = self.get(&format!("neo/{asteroid_id}"), &[]).await?;
        parse_orbital_data(&body)
    }
}
