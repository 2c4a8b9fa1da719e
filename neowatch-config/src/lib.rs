//! Configuration library for NeoWatch.
//!
//! Settings are layered: built-in defaults, then `neowatch.toml`, then
//! environment variables (optionally seeded from a `.env` file). The result
//! passes through guard rails before the server sees it.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AlertsConfig, Config, ConfigMetadata, DatabaseConfig, IngestConfig, PipelineSettings,
    QueueConfig, ServerConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
