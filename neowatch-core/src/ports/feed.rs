use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One close approach listed in the daily feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedObject {
    pub id: String,
    pub name: String,
    /// Upper bound of the estimated diameter.
    pub diameter_km: f64,
    /// Relative velocity at the first listed close approach.
    pub velocity_kph: f64,
}

/// Source of near-Earth objects and their orbital data.
#[async_trait]
pub trait NeoFeed: Send + Sync {
    /// Objects making a close approach on `date`.
    async fn objects_on(&self, date: NaiveDate) -> Result<Vec<FeedObject>>;

    /// The raw `orbital_data` object published for one asteroid.
    async fn orbital_data(&self, asteroid_id: &str) -> Result<serde_json::Value>;
}
