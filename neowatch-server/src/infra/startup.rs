use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neowatch_config::{Config, ConfigWarnings};
use neowatch_core::AsteroidRecord;
use neowatch_core::infrastructure::{
    InMemoryQueue, InMemoryResultStore, LogAlertPublisher, NeoWsClient, PostgresMessageQueue,
    PostgresResultStore, WebhookAlertPublisher,
};
use neowatch_core::ingest::{IngestReport, Ingestor};
use neowatch_core::pipeline::Collaborators;
use neowatch_core::ports::{AlertPublisher, MessageQueue, ResultStore};

/// Where queue messages and results live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    /// Process-local fakes. Nothing survives a restart.
    InMemory,
}

/// Everything the pipeline and the API need, built once at startup.
pub struct Services {
    pub collaborators: Collaborators,
    pub results: Arc<dyn ResultStore>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Quiet defaults; collisions still surface. Override via RUST_LOG.
                "info,pipeline::worker=info,pipeline::poller=info,orbit::kepler=warn,sqlx=warn,tower_http=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn log_config_warnings(warnings: &ConfigWarnings) {
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
}

pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("no database URL configured; set DATABASE_URL or database.url"))?;

    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")
}

pub fn alert_publisher(config: &Config) -> Result<Arc<dyn AlertPublisher>> {
    match &config.alerts.webhook_url {
        Some(url) => {
            info!(topic = %config.alerts.topic, "alerts delivered by webhook");
            let publisher = WebhookAlertPublisher::new(url.clone())
                .context("failed to build webhook alert publisher")?;
            Ok(Arc::new(publisher))
        }
        None => Ok(Arc::new(LogAlertPublisher)),
    }
}

async fn postgres_queue(config: &Config, pool: PgPool) -> Result<PostgresMessageQueue> {
    PostgresMessageQueue::new(pool, config.queue.max_receives)
        .await
        .context("message queue unavailable")
}

pub async fn build_services(config: &Config, backend: Backend) -> Result<Services> {
    let alerts = alert_publisher(config)?;

    let services = match backend {
        Backend::Postgres => {
            let pool = connect_pool(config).await?;
            neowatch_core::MIGRATOR
                .run(&pool)
                .await
                .context("failed to apply database migrations")?;

            let queue = postgres_queue(config, pool.clone()).await?;
            let results: Arc<dyn ResultStore> = Arc::new(
                PostgresResultStore::new(pool)
                    .await
                    .context("result store unavailable")?,
            );
            Services {
                collaborators: Collaborators {
                    queue: Arc::new(queue),
                    alerts,
                    results: Arc::clone(&results),
                },
                results,
            }
        }
        Backend::InMemory => {
            warn!("running with in-memory collaborators; results are not persisted");
            let results: Arc<dyn ResultStore> = Arc::new(InMemoryResultStore::new());
            Services {
                collaborators: Collaborators {
                    queue: Arc::new(
                        InMemoryQueue::new().with_max_receives(config.queue.max_receives),
                    ),
                    alerts,
                    results: Arc::clone(&results),
                },
                results,
            }
        }
    };

    Ok(services)
}

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = connect_pool(config).await?;
    neowatch_core::MIGRATOR
        .run(&pool)
        .await
        .context("failed to apply database migrations")?;
    info!("database migrations applied");
    Ok(())
}

/// Enqueue the asteroid payloads in a JSON file: either one message object
/// or an array of them. Every payload is validated before any is enqueued.
pub async fn seed_queue(queue: &dyn MessageQueue, path: &Path) -> Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("seed file {} is not JSON", path.display()))?;

    let payloads: Vec<String> = match document {
        Value::Array(items) => items.iter().map(Value::to_string).collect(),
        single @ Value::Object(_) => vec![single.to_string()],
        _ => bail!("seed file {} must hold an object or an array", path.display()),
    };

    for (index, payload) in payloads.iter().enumerate() {
        AsteroidRecord::from_json(payload)
            .with_context(|| format!("seed entry {index} is not a valid asteroid message"))?;
    }
    for payload in &payloads {
        queue.enqueue(payload).await.context("failed to enqueue seed entry")?;
    }

    info!(path = %path.display(), count = payloads.len(), "seeded work queue");
    Ok(payloads.len())
}

/// Pull one day of close approaches from NeoWs onto the Postgres queue.
pub async fn run_ingest(config: &Config, date: NaiveDate) -> Result<IngestReport> {
    let api_key = config.ingest.api_key.as_deref().ok_or_else(|| {
        anyhow!("no NeoWs API key configured; set NASA_API_KEY or ingest.api_key")
    })?;
    let feed = NeoWsClient::new(config.ingest.base_url.clone(), api_key)
        .context("failed to build NeoWs client")?;

    let pool = connect_pool(config).await?;
    neowatch_core::MIGRATOR
        .run(&pool)
        .await
        .context("failed to apply database migrations")?;
    let queue = postgres_queue(config, pool).await?;

    let report = Ingestor::new(Arc::new(feed), Arc::new(queue))
        .ingest_day(date)
        .await
        .with_context(|| format!("ingestion for {date} failed"))?;
    info!(
        %date,
        listed = report.listed,
        enqueued = report.enqueued,
        skipped = report.skipped,
        "ingestion finished"
    );
    Ok(report)
}
