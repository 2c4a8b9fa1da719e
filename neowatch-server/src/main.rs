//! # NeoWatch Server
//!
//! Screens near-Earth asteroids for collisions with Earth.
//!
//! The process long-polls a work queue for asteroid records, propagates each
//! orbit against Earth's over a century, raises an alert on any approach
//! below the collision threshold and stores every outcome. A small HTTP API
//! lists the most dangerous stored results and accepts new asteroid
//! payloads. The `ingest` subcommand fills the queue from NASA NeoWs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;

use neowatch_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use neowatch_core::pipeline::PipelineRuntime;
use neowatch_server::{
    AppState,
    infra::startup::{self, Backend},
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "neowatch-server")]
#[command(about = "Queue-driven asteroid collision screening with a read-side API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to neowatch.toml (defaults to $NEOWATCH_CONFIG or ./neowatch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Use process-local queue and result store instead of PostgreSQL
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Run the worker pipeline without the HTTP API
    #[arg(long, default_value_t = false)]
    no_api: bool,

    /// JSON file of asteroid messages to enqueue before the workers start
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
    /// Enqueue one day of NASA NeoWs close approaches and exit
    Ingest(IngestArgs),
}

#[derive(ClapArgs, Debug)]
struct IngestArgs {
    /// Feed day as YYYY-MM-DD (defaults to today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Db(DbCommand::Migrate)) => {
            let ConfigLoad { config, warnings } = load_config(&cli.serve)?;
            startup::init_tracing();
            startup::log_config_warnings(&warnings);
            startup::run_migrations(&config).await
        }
        Some(Command::Ingest(args)) => {
            let ConfigLoad { config, warnings } = load_config(&cli.serve)?;
            startup::init_tracing();
            startup::log_config_warnings(&warnings);
            let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
            startup::run_ingest(&config, date).await.map(|_| ())
        }
        None => run_server(cli.serve).await,
    }
}

fn load_config(args: &ServeArgs) -> anyhow::Result<ConfigLoad> {
    let options = ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: args.env_file.clone(),
    };
    ConfigLoader::with_options(options)
        .load()
        .context("failed to load configuration")
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let ConfigLoad {
        mut config,
        warnings,
    } = load_config(&args)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    startup::init_tracing();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }
    startup::log_config_warnings(&warnings);

    let backend = if args.in_memory {
        Backend::InMemory
    } else {
        Backend::Postgres
    };
    let services = startup::build_services(&config, backend).await?;
    let queue = Arc::clone(&services.collaborators.queue);

    if let Some(path) = args.seed.as_deref() {
        startup::seed_queue(queue.as_ref(), path).await?;
    }

    let runtime = PipelineRuntime::start(config.pipeline_config(), services.collaborators);
    let shutdown = runtime.shutdown_token();

    let api = if args.no_api {
        None
    } else {
        let addr: SocketAddr = config
            .server
            .bind_address()
            .parse()
            .with_context(|| format!("invalid bind address {}", config.server.bind_address()))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("Starting NeoWatch API on {addr}");

        let router = routes::create_router(AppState::new(queue, services.results));
        let api_shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(api_shutdown.cancelled_owned())
                .await
        }))
    };

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            info!("shutdown requested");
        }
        _ = shutdown.cancelled() => {}
    }

    runtime.shutdown().await;

    if let Some(api) = api {
        api.await
            .context("API task panicked")?
            .context("API server failed")?;
    }

    info!("NeoWatch stopped");
    Ok(())
}
