use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use neowatch_core::ingest::DEFAULT_NEOWS_BASE_URL;
use neowatch_core::orbit::SearchParams;
use neowatch_core::pipeline::config::DEFAULT_ALERT_TOPIC;

use crate::models::{
    AlertsConfig, Config, ConfigMetadata, DatabaseConfig, IngestConfig, PipelineSettings,
    QueueConfig, ServerConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["neowatch.toml", "config/neowatch.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// A loaded configuration plus the soft issues found along the way.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, read the process environment and the config file, and
    /// compose them.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather()?)?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose against an already gathered environment. The process
    /// environment and `.env` files are not consulted.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) = compose_config(file_config, env, config_path)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No neowatch.toml detected; using defaults and environment variables",
            "Create neowatch.toml or point NEOWATCH_CONFIG at one",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        queue: file_queue,
        alerts: file_alerts,
        pipeline: file_pipeline,
        simulation: file_simulation,
        ingest: file_ingest,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(8080),
    };

    let database = DatabaseConfig {
        url: env
            .database_url
            .or(file_database.url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty()),
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(10),
    };

    let queue = QueueConfig {
        max_messages: env
            .queue_max_messages
            .or(file_queue.max_messages)
            .unwrap_or(10),
        wait_seconds: env
            .queue_wait_seconds
            .or(file_queue.wait_seconds)
            .unwrap_or(20),
        visibility_timeout_seconds: env
            .queue_visibility_timeout_seconds
            .or(file_queue.visibility_timeout_seconds)
            .unwrap_or(30),
        max_receives: env
            .queue_max_receives
            .or(file_queue.max_receives)
            .unwrap_or(5),
    };

    let alerts = AlertsConfig {
        topic: env
            .alert_topic
            .or(file_alerts.topic)
            .unwrap_or_else(|| DEFAULT_ALERT_TOPIC.to_string()),
        webhook_url: env.alert_webhook_url.or(file_alerts.webhook_url),
    };

    let pipeline = PipelineSettings {
        workers: env.pipeline_workers.or(file_pipeline.workers).unwrap_or(5),
        intake_capacity: env
            .pipeline_intake_capacity
            .or(file_pipeline.intake_capacity)
            .unwrap_or(64),
    };

    let mut simulation = file_simulation.unwrap_or_else(SearchParams::default);
    if let Some(collision_km) = env.simulation_collision_km {
        simulation.collision_km = collision_km;
    }
    if let Some(horizon_days) = env.simulation_horizon_days {
        simulation.horizon_days = horizon_days;
    }

    let ingest = IngestConfig {
        api_key: env.neows_api_key.or(file_ingest.api_key),
        base_url: env
            .neows_base_url
            .or(file_ingest.base_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_NEOWS_BASE_URL.to_string()),
    };

    let config = Config {
        server,
        database,
        queue,
        alerts,
        pipeline,
        simulation,
        ingest,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    };

    warnings.extend(validation::apply_guard_rails(&config)?);
    Ok((config, warnings))
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("environment variable {name} has an invalid value")]
    InvalidEnv { name: &'static str },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
