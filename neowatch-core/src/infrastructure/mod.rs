//! Collaborator adapters.

pub mod alerts;
pub mod memory;

#[cfg(feature = "neows")]
#[cfg_attr(docsrs, doc(cfg(feature = "neows")))]
pub mod neows;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use alerts::LogAlertPublisher;
#[cfg(feature = "webhook")]
pub use alerts::WebhookAlertPublisher;
pub use memory::{InMemoryQueue, InMemoryResultStore, RecordingAlerts};
#[cfg(feature = "neows")]
pub use neows::NeoWsClient;
#[cfg(feature = "database")]
pub use postgres::{PostgresMessageQueue, PostgresResultStore};
