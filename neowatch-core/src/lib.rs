//! # NeoWatch Core
//!
//! Core library for the NeoWatch asteroid tracker: two-body orbit
//! propagation, close-approach search against Earth, and the queue-driven
//! worker pipeline that turns inbound asteroid records into alerts and
//! stored simulation results.
//!
//! ## Overview
//!
//! - **Orbit kernel**: calendar to Julian-date conversion, Kepler's equation,
//!   orbital-plane projection and rotation into the heliocentric ecliptic frame
//! - **Body state resolver**: position of a body at an instant from its
//!   orbital elements, with Earth baked in as a constant body
//! - **Collision search**: adaptive-step forward scan over a century horizon
//! - **Worker pipeline**: bounded intake, fixed worker pool, alert and
//!   persistence dispatch, acknowledgment after processing
//! - **Ingress poller**: long-polls the queue and feeds the intake
//! - **Ingestion**: pulls the day's close approaches from NASA NeoWs and
//!   enqueues one message per asteroid
//!
//! ## Feature Flags
//!
//! - `database`: Postgres-backed message queue and result store (SQLx)
//! - `webhook`: HTTP webhook alert publisher (reqwest)
//! - `neows`: NASA NeoWs feed client used by ingestion (reqwest)
//!
//! ## Examples
//!
//! ```
//! use neowatch_core::orbit::{CollisionSearch, EARTH, SearchParams};
//!
//! let search = CollisionSearch::new(SearchParams::default());
//! // A body sharing Earth's elements sits on top of Earth.
//! let outcome = search.run(&EARTH, &EARTH, 2_451_545.0);
//! assert!(outcome.is_collision());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Error types and error handling utilities
pub mod error;

/// Orbit kernel, body state resolver and collision search
pub mod orbit;

/// Domain records: inbound asteroid messages and simulation outcomes
pub mod types;

/// Collaborator contracts consumed by the pipeline
pub mod ports;

/// Adapters implementing the collaborator contracts
pub mod infrastructure;

/// Worker pool, ingress poller and runtime supervision
pub mod pipeline;

/// Feed ingestion: NeoWs close approaches into queue messages
pub mod ingest;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use error::{Result, TrackerError};
pub use types::{AsteroidRecord, SimulationOutcome};
