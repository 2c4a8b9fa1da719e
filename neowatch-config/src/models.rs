use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use neowatch_core::orbit::SearchParams;
use neowatch_core::pipeline::PipelineConfig;
use neowatch_core::ports::ReceiveRequest;

/// Fully resolved configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub alerts: AlertsConfig,
    pub pipeline: PipelineSettings,
    pub simulation: SearchParams,
    pub ingest: IngestConfig,
    #[serde(skip)]
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseConfig {
    /// Connection string. `None` is only usable with in-memory collaborators.
    #[serde(skip)]
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueConfig {
    pub max_messages: usize,
    pub wait_seconds: u64,
    pub visibility_timeout_seconds: u64,
    /// Deliveries after which a message is dead-lettered.
    pub max_receives: u32,
}

impl QueueConfig {
    pub fn receive_request(&self) -> ReceiveRequest {
        ReceiveRequest {
            max_messages: self.max_messages,
            wait: Duration::from_secs(self.wait_seconds),
            visibility_timeout: Duration::from_secs(self.visibility_timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsConfig {
    pub topic: String,
    /// Without a webhook, alerts only go to the log.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineSettings {
    pub workers: usize,
    pub intake_capacity: usize,
}

/// NASA NeoWs feed access for the `ingest` command.
#[derive(Debug, Clone, Serialize)]
pub struct IngestConfig {
    /// Only required by `ingest`; the worker never calls the feed.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Config {
    /// Settings handed to the pipeline runtime.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.pipeline.workers,
            intake_capacity: self.pipeline.intake_capacity,
            receive: self.queue.receive_request(),
            alert_topic: self.alerts.topic.clone(),
            search: self.simulation,
            ..PipelineConfig::default()
        }
    }
}
