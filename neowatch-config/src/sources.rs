use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use neowatch_core::orbit::SearchParams;

use crate::loader::ConfigLoadError;
use crate::util::{non_empty_var, parse_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub queue: FileQueueConfig,
    #[serde(default)]
    pub alerts: FileAlertsConfig,
    #[serde(default)]
    pub pipeline: FilePipelineConfig,
    #[serde(default)]
    pub ingest: FileIngestConfig,
    /// Collision search thresholds. Missing keys keep their defaults.
    pub simulation: Option<SearchParams>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileQueueConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_receives: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAlertsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePipelineConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake_capacity: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileIngestConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub queue_max_messages: Option<usize>,
    pub queue_wait_seconds: Option<u64>,
    pub queue_visibility_timeout_seconds: Option<u64>,
    pub queue_max_receives: Option<u32>,
    pub alert_topic: Option<String>,
    pub alert_webhook_url: Option<String>,
    pub pipeline_workers: Option<usize>,
    pub pipeline_intake_capacity: Option<usize>,
    pub simulation_collision_km: Option<f64>,
    pub simulation_horizon_days: Option<f64>,
    pub neows_api_key: Option<String>,
    pub neows_base_url: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Result<Self, ConfigLoadError> {
        let invalid = |name: &'static str| ConfigLoadError::InvalidEnv { name };

        Ok(Self {
            config_path: non_empty_var("NEOWATCH_CONFIG").map(PathBuf::from),
            server_host: non_empty_var("SERVER_HOST"),
            server_port: parse_var("SERVER_PORT").map_err(invalid)?,
            database_url: non_empty_var("DATABASE_URL")
                .or_else(|| non_empty_var("DB_CONNECTION_STRING")),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                .map_err(invalid)?,
            queue_max_messages: parse_var("QUEUE_MAX_MESSAGES").map_err(invalid)?,
            queue_wait_seconds: parse_var("QUEUE_WAIT_SECONDS").map_err(invalid)?,
            queue_visibility_timeout_seconds: parse_var(
                "QUEUE_VISIBILITY_TIMEOUT_SECONDS",
            )
            .map_err(invalid)?,
            queue_max_receives: parse_var("QUEUE_MAX_RECEIVES").map_err(invalid)?,
            alert_topic: non_empty_var("ALERT_TOPIC")
                .or_else(|| non_empty_var("AWS_SNS_TOPIC_ARN")),
            alert_webhook_url: non_empty_var("ALERT_WEBHOOK_URL"),
            pipeline_workers: parse_var("PIPELINE_WORKERS").map_err(invalid)?,
            pipeline_intake_capacity: parse_var("PIPELINE_INTAKE_CAPACITY")
                .map_err(invalid)?,
            simulation_collision_km: parse_var("SIMULATION_COLLISION_KM")
                .map_err(invalid)?,
            simulation_horizon_days: parse_var("SIMULATION_HORIZON_DAYS")
                .map_err(invalid)?,
            neows_api_key: non_empty_var("NASA_API_KEY"),
            neows_base_url: non_empty_var("NEOWS_BASE_URL"),
        })
    }
}
