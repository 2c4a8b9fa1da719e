use std::fmt;

use thiserror::Error;

use crate::models::Config;

/// Largest batch a single receive may ask for.
pub const MAX_RECEIVE_BATCH: usize = 10;
/// Longest long-poll wait a single receive may ask for.
pub const MAX_WAIT_SECONDS: u64 = 20;

/// Hard configuration errors. Loading fails on any of these.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("pipeline.workers must be at least 1")]
    NoWorkers,
    #[error("pipeline.intake_capacity must be at least 1")]
    NoIntakeCapacity,
    #[error("queue.max_messages must be between 1 and 10, got {0}")]
    ReceiveBatch(usize),
    #[error("queue.wait_seconds must not exceed 20, got {0}")]
    WaitTooLong(u64),
    #[error("queue.visibility_timeout_seconds must be at least 1")]
    NoVisibilityTimeout,
    #[error("queue.max_receives must be at least 1")]
    NoReceives,
    #[error("database.max_connections must be at least 1")]
    NoConnections,
    #[error("simulation.{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error(
        "simulation.collision_km ({collision_km}) must be below simulation.fine_step_radius_km ({fine_step_radius_km})"
    )]
    CollisionOutsideFineStep {
        collision_km: f64,
        fine_step_radius_km: f64,
    },
    #[error("alerts.webhook_url is not a valid http(s) URL: {0}")]
    WebhookUrl(String),
    #[error("ingest.base_url is not a valid http(s) URL: {0}")]
    NeoWsUrl(String),
}

/// A soft issue worth logging at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{} ({hint})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigWarnings {
    items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(&mut self, message: impl Into<String>, hint: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.pipeline.workers == 0 {
        return Err(ConfigGuardRailError::NoWorkers);
    }
    if config.pipeline.intake_capacity == 0 {
        return Err(ConfigGuardRailError::NoIntakeCapacity);
    }
    if config.database.max_connections == 0 {
        return Err(ConfigGuardRailError::NoConnections);
    }

    let queue = &config.queue;
    if !(1..=MAX_RECEIVE_BATCH).contains(&queue.max_messages) {
        return Err(ConfigGuardRailError::ReceiveBatch(queue.max_messages));
    }
    if queue.wait_seconds > MAX_WAIT_SECONDS {
        return Err(ConfigGuardRailError::WaitTooLong(queue.wait_seconds));
    }
    if queue.visibility_timeout_seconds == 0 {
        return Err(ConfigGuardRailError::NoVisibilityTimeout);
    }
    if queue.max_receives == 0 {
        return Err(ConfigGuardRailError::NoReceives);
    }

    let sim = &config.simulation;
    for (field, value) in [
        ("collision_km", sim.collision_km),
        ("fine_step_radius_km", sim.fine_step_radius_km),
        ("fine_step_days", sim.fine_step_days),
        ("coarse_step_days", sim.coarse_step_days),
        ("divergence_window_km", sim.divergence_window_km),
        ("divergence_margin_km", sim.divergence_margin_km),
        ("horizon_days", sim.horizon_days),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigGuardRailError::NonPositive { field, value });
        }
    }
    if sim.collision_km >= sim.fine_step_radius_km {
        return Err(ConfigGuardRailError::CollisionOutsideFineStep {
            collision_km: sim.collision_km,
            fine_step_radius_km: sim.fine_step_radius_km,
        });
    }

    if !is_http_url(&config.ingest.base_url) {
        return Err(ConfigGuardRailError::NeoWsUrl(config.ingest.base_url.clone()));
    }

    match &config.alerts.webhook_url {
        Some(raw) => {
            if !is_http_url(raw) {
                return Err(ConfigGuardRailError::WebhookUrl(raw.clone()));
            }
        }
        None => warnings.push_with_hint(
            "No alert webhook configured; collision alerts go to the log only",
            "Set ALERT_WEBHOOK_URL or alerts.webhook_url",
        ),
    }

    if queue.visibility_timeout_seconds < queue.wait_seconds {
        warnings.push(format!(
            "queue.visibility_timeout_seconds ({}) is shorter than queue.wait_seconds ({}); slow simulations may be redelivered",
            queue.visibility_timeout_seconds, queue.wait_seconds
        ));
    }

    if sim.fine_step_days > sim.coarse_step_days {
        warnings.push("simulation.fine_step_days is larger than simulation.coarse_step_days");
    }

    Ok(warnings)
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"))
}
