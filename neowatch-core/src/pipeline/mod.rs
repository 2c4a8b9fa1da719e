//! Queue-driven processing of asteroid records.
//!
//! The [`IngressPoller`] long-polls the work queue and pushes messages into a
//! bounded intake channel. A fixed pool of [`Worker`]s drains the intake,
//! runs the collision search for each record, dispatches the alert and the
//! stored result, and acknowledges the message. [`PipelineRuntime`] wires
//! the pieces together and owns the shutdown token.

pub mod alert;
pub mod config;
pub mod poller;
pub mod runtime;
pub mod worker;

pub use alert::format_collision_alert;
pub use config::PipelineConfig;
pub use poller::IngressPoller;
pub use runtime::PipelineRuntime;
pub use worker::{Collaborators, Disposition, Worker};
