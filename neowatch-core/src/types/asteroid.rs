use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::orbit::elements::OrbitalElements;

/// One near-Earth object as delivered on the work queue.
///
/// Physical attributes travel with the record for downstream consumers; the
/// propagator only reads [`AsteroidRecord::elements`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AsteroidRecord {
    pub id: String,
    pub name: String,
    pub diameter_km: f64,
    pub velocity_kph: f64,
    pub elements: OrbitalElements,
    pub minimum_orbit_intersection: Option<String>,
}

impl AsteroidRecord {
    /// Parse and validate one queue payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let message: AsteroidMessage = serde_json::from_str(payload)?;
        let record = Self::from(message);
        record.elements.validate()?;
        Ok(record)
    }
}

/// Wire shape of an inbound message.
#[derive(Clone, Debug, Deserialize)]
pub struct AsteroidMessage {
    pub id: String,
    #[serde(rename = "asteroid")]
    pub name: String,
    #[serde(default)]
    pub diameter_km: f64,
    #[serde(default)]
    pub velocity_kph: f64,
    pub orbital_elements: WireOrbitalElements,
}

/// Orbital elements as published by the NeoWs feed: numbers encoded as
/// strings, angles in degrees.
#[derive(Clone, Debug, Deserialize)]
pub struct WireOrbitalElements {
    #[serde(deserialize_with = "numeric_string")]
    pub eccentricity: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub semi_major_axis: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub inclination: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub ascending_node_longitude: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub perihelion_argument: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub mean_anomaly: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub mean_motion: f64,
    #[serde(deserialize_with = "numeric_string")]
    pub epoch_osculation: f64,
    #[serde(default)]
    pub minimum_orbit_intersection: Option<String>,
}

impl From<AsteroidMessage> for AsteroidRecord {
    fn from(message: AsteroidMessage) -> Self {
        let wire = message.orbital_elements;
        Self {
            id: message.id,
            name: message.name,
            diameter_km: message.diameter_km,
            velocity_kph: message.velocity_kph,
            elements: OrbitalElements {
                semi_major_axis: wire.semi_major_axis,
                eccentricity: wire.eccentricity,
                inclination: wire.inclination,
                ascending_node: wire.ascending_node_longitude,
                perihelion_argument: wire.perihelion_argument,
                mean_anomaly: wire.mean_anomaly,
                mean_motion: wire.mean_motion,
                epoch: wire.epoch_osculation,
            },
            minimum_orbit_intersection: wire.minimum_orbit_intersection,
        }
    }
}

pub(crate) fn numeric_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Text(String),
        Number(f64),
    }

    match Numeric::deserialize(deserializer)? {
        Numeric::Number(value) => Ok(value),
        Numeric::Text(raw) => raw.trim().parse::<f64>().map_err(|err| {
            serde::de::Error::custom(format!("invalid number {raw:?}: {err}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::error::TrackerError;

    const EROS: &str = r#"{
        "id": "2000433",
        "asteroid": "433 Eros (A898 PA)",
        "diameter_km": 36.2,
        "velocity_kph": 22000.5,
        "orbital_elements": {
            "orbit_id": "659",
            "eccentricity": ".2228359407071628",
            "semi_major_axis": "1.458120998474684",
            "inclination": "10.82846651399785",
            "ascending_node_longitude": "304.2701025753316",
            "perihelion_argument": "178.9297536744151",
            "mean_anomaly": "310.5543277370992",
            "mean_motion": ".5597752949285997",
            "epoch_osculation": "2461000.5",
            "minimum_orbit_intersection": ".148353"
        }
    }"#;

    #[test]
    fn parses_string_encoded_elements() {
        let record = AsteroidRecord::from_json(EROS).expect("valid payload");
        assert_eq!(record.id, "2000433");
        assert_eq!(record.name, "433 Eros (A898 PA)");
        assert_relative_eq!(record.elements.eccentricity, 0.2228359407071628);
        assert_relative_eq!(record.elements.epoch, 2_461_000.5);
        assert_eq!(record.minimum_orbit_intersection.as_deref(), Some(".148353"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AsteroidRecord::from_json("{not json").unwrap_err();
        assert!(matches!(err, TrackerError::Parse(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn non_numeric_element_is_a_parse_error() {
        let payload = EROS.replace("\"1.458120998474684\"", "\"wide\"");
        let err = AsteroidRecord::from_json(&payload).unwrap_err();
        assert!(matches!(err, TrackerError::Parse(_)), "{err}");
    }

    #[test]
    fn unbound_orbit_is_rejected_after_parsing() {
        let payload = EROS.replace("\".2228359407071628\"", "\"1.4\"");
        let err = AsteroidRecord::from_json(&payload).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidElements(_)), "{err}");
        assert!(err.is_input_error());
    }
}
