//! Daily ingestion from the NASA NeoWs API.
//!
//! The feed lists the day's close approaches; each object's orbital data
//! comes from a second lookup. Both are merged into the message shape the
//! worker pipeline consumes and appended to the work queue.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, TrackerError};
use crate::ports::{FeedObject, MessageQueue, NeoFeed};
use crate::types::AsteroidRecord;
use crate::types::asteroid::numeric_string;

pub const DEFAULT_NEOWS_BASE_URL: &str = "https://api.nasa.gov/neo/rest/v1";

/// Outbound queue payload. Same shape [`AsteroidRecord::from_json`] reads.
#[derive(Debug, Serialize)]
pub struct AsteroidEnvelope<'a> {
    pub id: &'a str,
    #[serde(rename = "asteroid")]
    pub name: &'a str,
    pub diameter_km: f64,
    pub velocity_kph: f64,
    pub orbital_elements: &'a Value,
}

impl<'a> AsteroidEnvelope<'a> {
    pub fn new(object: &'a FeedObject, orbital_elements: &'a Value) -> Self {
        Self {
            id: &object.id,
            name: &object.name,
            diameter_km: object.diameter_km,
            velocity_kph: object.velocity_kph,
            orbital_elements,
        }
    }
}

/// Counts from one ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub listed: usize,
    pub enqueued: usize,
    pub skipped: usize,
}

/// Moves one day of the feed onto the work queue.
pub struct Ingestor {
    feed: Arc<dyn NeoFeed>,
    queue: Arc<dyn MessageQueue>,
}

impl fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingestor")
            .field("feed", &std::any::type_name_of_val(self.feed.as_ref()))
            .field("queue", &std::any::type_name_of_val(self.queue.as_ref()))
            .finish()
    }
}

impl Ingestor {
    pub fn new(feed: Arc<dyn NeoFeed>, queue: Arc<dyn MessageQueue>) -> Self {
        Self { feed, queue }
    }

    /// Enqueue every object listed for `date`.
    ///
    /// An object whose orbital data cannot be fetched or would not pass the
    /// worker's validation is skipped. A failing feed listing or queue aborts
    /// the run.
    pub async fn ingest_day(&self, date: NaiveDate) -> Result<IngestReport> {
        let objects = self.feed.objects_on(date).await?;
        let mut report = IngestReport {
            listed: objects.len(),
            ..IngestReport::default()
        };
        if objects.is_empty() {
            info!(target: "ingest", %date, "no asteroids listed");
            return Ok(report);
        }

        for object in &objects {
            let orbital = match self.feed.orbital_data(&object.id).await {
                Ok(orbital) => orbital,
                Err(err) => {
                    warn!(
                        target: "ingest",
                        asteroid = %object.id,
                        error = %err,
                        "orbital data unavailable, skipping"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let body = serde_json::to_string(&AsteroidEnvelope::new(object, &orbital))?;
            if let Err(err) = AsteroidRecord::from_json(&body) {
                warn!(
                    target: "ingest",
                    asteroid = %object.id,
                    error = %err,
                    "orbital data unusable, skipping"
                );
                report.skipped += 1;
                continue;
            }

            let message_id = self.queue.enqueue(&body).await?;
            info!(
                target: "ingest",
                asteroid = %object.id,
                name = %object.name,
                %message_id,
                "asteroid enqueued"
            );
            report.enqueued += 1;
        }

        Ok(report)
    }
}

#[derive(Deserialize)]
struct FeedPage {
    #[serde(default)]
    near_earth_objects: HashMap<String, Vec<FeedEntry>>,
}

#[derive(Deserialize)]
struct FeedEntry {
    id: String,
    name: String,
    #[serde(default)]
    estimated_diameter: Option<EstimatedDiameter>,
    #[serde(default)]
    close_approach_data: Vec<CloseApproach>,
}

#[derive(Deserialize)]
struct EstimatedDiameter {
    kilometers: DiameterRange,
}

#[derive(Deserialize)]
struct DiameterRange {
    estimated_diameter_max: f64,
}

#[derive(Deserialize)]
struct CloseApproach {
    relative_velocity: RelativeVelocity,
}

#[derive(Deserialize)]
struct RelativeVelocity {
    #[serde(deserialize_with = "numeric_string")]
    kilometers_per_hour: f64,
}

#[derive(Deserialize)]
struct NeoDetail {
    orbital_data: Value,
}

/// Objects listed under `date` in a `/feed` response body.
pub fn parse_feed(body: &str, date: NaiveDate) -> Result<Vec<FeedObject>> {
    let mut page: FeedPage = serde_json::from_str(body)
        .map_err(|e| TrackerError::Feed(format!("malformed feed page: {e}")))?;

    let entries = page
        .near_earth_objects
        .remove(&date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    Ok(entries
        .into_iter()
        .map(|entry| FeedObject {
            diameter_km: entry
                .estimated_diameter
                .map(|d| d.kilometers.estimated_diameter_max)
                .unwrap_or_default(),
            velocity_kph: entry
                .close_approach_data
                .first()
                .map(|approach| approach.relative_velocity.kilometers_per_hour)
                .unwrap_or_default(),
            id: entry.id,
            name: entry.name,
        })
        .collect())
}

/// The `orbital_data` object from a `/neo/{id}` response body.
pub fn parse_orbital_data(body: &str) -> Result<Value> {
    let detail: NeoDetail = serde_json::from_str(body)
        .map_err(|e| TrackerError::Feed(format!("malformed object detail: {e}")))?;
    Ok(detail.orbital_data)
}
