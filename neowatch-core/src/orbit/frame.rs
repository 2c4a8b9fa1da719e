//! Heliocentric ecliptic reference frame.

use serde::{Deserialize, Serialize};

/// Position in the shared heliocentric ecliptic frame (AU).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl StateVector {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distance from the Sun.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &StateVector) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Rotate an orbital-plane position into the ecliptic frame.
///
/// Applies `R_z(-Ω) · R_x(-i) · R_z(-ω)` to `(x, y, 0)`. All angles in
/// radians.
pub fn rotate_to_reference_frame(
    x: f64,
    y: f64,
    inclination: f64,
    ascending_node: f64,
    perihelion_argument: f64,
) -> StateVector {
    let (sin_o, cos_o) = ascending_node.sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();
    let (sin_w, cos_w) = perihelion_argument.sin_cos();

    StateVector {
        x: (cos_o * cos_w - sin_o * sin_w * cos_i) * x
            + (-cos_o * sin_w - sin_o * cos_w * cos_i) * y,
        y: (sin_o * cos_w + cos_o * sin_w * cos_i) * x
            + (-sin_o * sin_w + cos_o * cos_w * cos_i) * y,
        z: (sin_w * sin_i) * x + (cos_w * sin_i) * y,
    }
}
