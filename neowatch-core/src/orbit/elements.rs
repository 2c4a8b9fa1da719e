//! Keplerian orbital elements.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::orbit::time::{J2000, JulianDate};

/// Classical orbital elements of a body orbiting the Sun.
///
/// Angles are kept in degrees exactly as published; the resolver converts
/// them to radians once before use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis (AU)
    pub semi_major_axis: f64,
    /// Eccentricity (dimensionless, `0 <= e < 1` for bound orbits)
    pub eccentricity: f64,
    /// Inclination to the ecliptic (degrees)
    pub inclination: f64,
    /// Longitude of the ascending node (degrees)
    pub ascending_node: f64,
    /// Argument of perihelion (degrees)
    pub perihelion_argument: f64,
    /// Mean anomaly at epoch (degrees)
    pub mean_anomaly: f64,
    /// Mean motion (degrees per day)
    pub mean_motion: f64,
    /// Epoch of osculation (Julian date)
    pub epoch: JulianDate,
}

/// Earth's mean elements at J2000.
pub const EARTH: OrbitalElements = OrbitalElements {
    semi_major_axis: 1.000_000_11,
    eccentricity: 0.016_710_22,
    inclination: 0.000_05,
    ascending_node: -11.260_64,
    perihelion_argument: 102.947_19,
    mean_anomaly: 100.464_35,
    mean_motion: 0.985_607_685_9,
    epoch: J2000,
};

impl OrbitalElements {
    /// Check the elements describe a bound two-body orbit the kernel can
    /// propagate.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("semi_major_axis", self.semi_major_axis),
            ("eccentricity", self.eccentricity),
            ("inclination", self.inclination),
            ("ascending_node_longitude", self.ascending_node),
            ("perihelion_argument", self.perihelion_argument),
            ("mean_anomaly", self.mean_anomaly),
            ("mean_motion", self.mean_motion),
            ("epoch_osculation", self.epoch),
        ];

        if let Some((name, value)) =
            fields.iter().find(|(_, value)| !value.is_finite())
        {
            return Err(TrackerError::InvalidElements(format!(
                "{name} is not a finite number ({value})"
            )));
        }

        if self.semi_major_axis <= 0.0 {
            return Err(TrackerError::InvalidElements(format!(
                "semi_major_axis must be positive, got {}",
                self.semi_major_axis
            )));
        }

        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(TrackerError::InvalidElements(format!(
                "eccentricity must be in [0, 1), got {}",
                self.eccentricity
            )));
        }

        Ok(())
    }

    /// Perihelion distance `a(1 - e)` in AU.
    pub fn perihelion_distance(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Aphelion distance `a(1 + e)` in AU.
    pub fn aphelion_distance(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// Orbital period in days.
    pub fn period_days(&self) -> f64 {
        360.0 / self.mean_motion
    }
}
