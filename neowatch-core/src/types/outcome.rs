use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orbit::time::JulianDate;

/// Terminal state of one collision search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationOutcome {
    /// Separation dropped below the collision threshold.
    Collision {
        impact_time: JulianDate,
        miss_distance_km: f64,
    },
    /// Horizon exhausted or the encounter diverged without a collision.
    NoCollision { min_distance_km: f64 },
}

impl SimulationOutcome {
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }

    /// Closest separation observed, in kilometers.
    pub fn closest_distance_km(&self) -> f64 {
        match *self {
            Self::Collision {
                miss_distance_km, ..
            } => miss_distance_km,
            Self::NoCollision { min_distance_km } => min_distance_km,
        }
    }

    pub fn impact_time(&self) -> Option<JulianDate> {
        match *self {
            Self::Collision { impact_time, .. } => Some(impact_time),
            Self::NoCollision { .. } => None,
        }
    }
}

/// Row handed to the result store once per processed message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub asteroid_id: String,
    pub name: String,
    pub closest_distance_km: f64,
    /// Julian date of impact, `0.0` when no collision was found.
    pub impact_date: JulianDate,
    pub is_dangerous: bool,
}

impl ResultRecord {
    pub fn from_outcome(
        asteroid_id: impl Into<String>,
        name: impl Into<String>,
        outcome: &SimulationOutcome,
    ) -> Self {
        Self {
            asteroid_id: asteroid_id.into(),
            name: name.into(),
            closest_distance_km: outcome.closest_distance_km(),
            impact_date: outcome.impact_time().unwrap_or(0.0),
            is_dangerous: outcome.is_collision(),
        }
    }
}

/// A persisted result as returned by the read side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct StoredResult {
    pub id: i64,
    pub asteroid_id: String,
    pub name: String,
    pub closest_distance_km: f64,
    pub impact_date: f64,
    pub is_dangerous: bool,
    pub created_at: DateTime<Utc>,
}
