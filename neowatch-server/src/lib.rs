//! # NeoWatch Server
//!
//! Wiring for the NeoWatch worker service: configuration, collaborator
//! construction, the worker pipeline and the read-side HTTP API.
//!
//! The binary lives in `main.rs`; this library exposes the router and the
//! startup helpers so they can be exercised from tests.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
