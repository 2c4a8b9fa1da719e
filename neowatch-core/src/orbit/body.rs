//! Body state resolver.

use crate::orbit::elements::OrbitalElements;
use crate::orbit::frame::{StateVector, rotate_to_reference_frame};
use crate::orbit::kepler::{
    mean_anomaly_at, plane_coordinates, solve_eccentric_anomaly,
};
use crate::orbit::time::JulianDate;

/// Anything that can report its heliocentric position at an instant.
pub trait Ephemeris {
    fn position_at(&self, at: JulianDate) -> StateVector;
}

/// Position of a body at `at` from its orbital elements.
///
/// Mean anomaly, then eccentric anomaly, then orbital-plane coordinates,
/// then rotation into the ecliptic frame. Pure: identical input yields
/// identical output.
pub fn resolve_state(elements: &OrbitalElements, at: JulianDate) -> StateVector {
    let mean_anomaly = mean_anomaly_at(elements, at).to_radians();
    let eccentric_anomaly =
        solve_eccentric_anomaly(mean_anomaly, elements.eccentricity);
    let (x, y) = plane_coordinates(
        eccentric_anomaly,
        elements.eccentricity,
        elements.semi_major_axis,
    );

    rotate_to_reference_frame(
        x,
        y,
        elements.inclination.to_radians(),
        elements.ascending_node.to_radians(),
        elements.perihelion_argument.to_radians(),
    )
}

impl Ephemeris for OrbitalElements {
    fn position_at(&self, at: JulianDate) -> StateVector {
        resolve_state(self, at)
    }
}

impl<T: Ephemeris + ?Sized> Ephemeris for &T {
    fn position_at(&self, at: JulianDate) -> StateVector {
        (**self).position_at(at)
    }
}
