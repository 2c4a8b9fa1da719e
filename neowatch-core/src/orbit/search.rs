//! Close-approach search between two bodies.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::orbit::body::Ephemeris;
use crate::orbit::time::JulianDate;
use crate::types::SimulationOutcome;

/// Kilometers per astronomical unit.
pub const AU_KM: f64 = 149_600_000.0;

/// Steps between cancellation checks.
const CANCEL_POLL_INTERVAL: u32 = 256;

/// Thresholds steering the search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// A sampled separation below this is a collision (km).
    pub collision_km: f64,
    /// Below this separation the search switches to the fine step (km).
    pub fine_step_radius_km: f64,
    /// Sampling step near a close approach (days).
    pub fine_step_days: f64,
    /// Sampling step everywhere else (days).
    pub coarse_step_days: f64,
    /// Divergence is only tracked once the running minimum is below this (km).
    pub divergence_window_km: f64,
    /// Growth over the running minimum that ends the encounter (km).
    pub divergence_margin_km: f64,
    /// How far past the start instant to search (days).
    pub horizon_days: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            collision_km: 6_000.0,
            fine_step_radius_km: 10_000_000.0,
            fine_step_days: 1.0 / 24.0,
            coarse_step_days: 1.0,
            divergence_window_km: 50_000_000.0,
            divergence_margin_km: 1_000_000.0,
            horizon_days: 100.0 * 365.0,
        }
    }
}

/// Forward-time scan for the closest approach of a target body to a
/// reference body.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionSearch {
    params: SearchParams,
}

#[derive(Debug)]
struct Cursor {
    time: JulianDate,
    horizon: JulianDate,
    min_distance_km: f64,
}

impl CollisionSearch {
    pub fn new(params: SearchParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Run to completion. Always yields exactly one outcome.
    pub fn run<T, R>(
        &self,
        target: &T,
        reference: &R,
        start: JulianDate,
    ) -> SimulationOutcome
    where
        T: Ephemeris + ?Sized,
        R: Ephemeris + ?Sized,
    {
        let mut cursor = self.cursor(start);
        loop {
            if let Some(outcome) = self.advance(target, reference, &mut cursor) {
                return outcome;
            }
        }
    }

    /// Run until an outcome is reached or `cancel` fires. A cancelled search
    /// yields `None` and emits nothing.
    pub fn run_until_cancelled<T, R>(
        &self,
        target: &T,
        reference: &R,
        start: JulianDate,
        cancel: &CancellationToken,
    ) -> Option<SimulationOutcome>
    where
        T: Ephemeris + ?Sized,
        R: Ephemeris + ?Sized,
    {
        let mut cursor = self.cursor(start);
        let mut steps: u32 = 0;
        loop {
            if steps % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
                return None;
            }
            steps = steps.wrapping_add(1);

            if let Some(outcome) = self.advance(target, reference, &mut cursor) {
                return Some(outcome);
            }
        }
    }

    fn cursor(&self, start: JulianDate) -> Cursor {
        Cursor {
            time: start,
            horizon: start + self.params.horizon_days,
            min_distance_km: f64::INFINITY,
        }
    }

    /// Sample one instant and move the cursor. Returns the terminal outcome
    /// once one is reached.
    fn advance<T, R>(
        &self,
        target: &T,
        reference: &R,
        cursor: &mut Cursor,
    ) -> Option<SimulationOutcome>
    where
        T: Ephemeris + ?Sized,
        R: Ephemeris + ?Sized,
    {
        let p = &self.params;
        let distance_km = target
            .position_at(cursor.time)
            .distance_to(&reference.position_at(cursor.time))
            * AU_KM;

        if distance_km < p.collision_km {
            return Some(SimulationOutcome::Collision {
                impact_time: cursor.time,
                miss_distance_km: distance_km,
            });
        }

        cursor.min_distance_km = cursor.min_distance_km.min(distance_km);

        if cursor.min_distance_km < p.divergence_window_km
            && distance_km > cursor.min_distance_km + p.divergence_margin_km
        {
            return Some(SimulationOutcome::NoCollision {
                min_distance_km: cursor.min_distance_km,
            });
        }

        cursor.time += if distance_km < p.fine_step_radius_km {
            p.fine_step_days
        } else {
            p.coarse_step_days
        };

        if cursor.time > cursor.horizon {
            return Some(SimulationOutcome::NoCollision {
                min_distance_km: cursor.min_distance_km,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use crate::orbit::elements::{EARTH, OrbitalElements};
    use crate::orbit::frame::StateVector;
    use crate::orbit::time::J2000;

    /// Straight-line flyby past a body parked at the origin.
    struct Flyby {
        closest_km: f64,
        speed_km_per_day: f64,
        closest_time: JulianDate,
    }

    impl Ephemeris for Flyby {
        fn position_at(&self, at: JulianDate) -> StateVector {
            let along = self.speed_km_per_day * (at - self.closest_time);
            StateVector::new(self.closest_km / AU_KM, along / AU_KM, 0.0)
        }
    }

    struct Parked;

    impl Ephemeris for Parked {
        fn position_at(&self, _at: JulianDate) -> StateVector {
            StateVector::ORIGIN
        }
    }

    fn flyby(closest_km: f64) -> Flyby {
        Flyby {
            closest_km,
            speed_km_per_day: 24_000.0,
            closest_time: J2000 + 30.0,
        }
    }

    #[test]
    fn close_pass_is_a_collision() {
        let search = CollisionSearch::default();
        let outcome = search.run(&flyby(5_000.0), &Parked, J2000);

        match outcome {
            SimulationOutcome::Collision {
                impact_time,
                miss_distance_km,
            } => {
                assert!(miss_distance_km < 6_000.0);
                assert_abs_diff_eq!(impact_time, J2000 + 30.0, epsilon = 0.2);
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn distant_pass_scans_full_horizon_without_collision() {
        let search = CollisionSearch::default();
        let outcome = search.run(&flyby(100_000_000.0), &Parked, J2000);

        match outcome {
            SimulationOutcome::NoCollision { min_distance_km } => {
                assert_abs_diff_eq!(min_distance_km, 100_000_000.0, epsilon = 1.0);
            }
            other => panic!("expected no collision, got {other:?}"),
        }
    }

    #[test]
    fn receding_encounter_terminates_early() {
        let params = SearchParams::default();
        let search = CollisionSearch::new(params);
        let target = Flyby {
            closest_km: 20_000_000.0,
            speed_km_per_day: 2_000_000.0,
            closest_time: J2000 + 100.0,
        };

        let outcome = search.run(&target, &Parked, J2000);
        let SimulationOutcome::NoCollision { min_distance_km } = outcome else {
            panic!("expected no collision, got {outcome:?}");
        };
        assert_relative_eq!(min_distance_km, 20_000_000.0, max_relative = 5e-3);
    }

    #[test]
    fn early_exit_reports_minimum_not_current_distance() {
        // Horizon far beyond the encounter; only divergence can stop the
        // search before the horizon, and the reported value is the minimum.
        let search = CollisionSearch::new(SearchParams {
            horizon_days: 1.0e9,
            ..SearchParams::default()
        });
        let target = flyby(30_000_000.0);
        let outcome = search.run(&target, &Parked, J2000);
        assert!(outcome.closest_distance_km() <= 30_000_000.0 + 1.0);
    }

    #[test]
    fn body_on_top_of_earth_collides_immediately() {
        let search = CollisionSearch::default();
        let outcome = search.run(&EARTH, &EARTH, J2000);
        assert_eq!(
            outcome,
            SimulationOutcome::Collision {
                impact_time: J2000,
                miss_distance_km: 0.0,
            }
        );
    }

    #[test]
    fn distant_asteroid_never_collides_with_earth() {
        let outer = OrbitalElements {
            semi_major_axis: 3.2,
            eccentricity: 0.05,
            mean_motion: 0.1722,
            ..EARTH
        };
        let outcome = CollisionSearch::default().run(&outer, &EARTH, J2000);
        assert!(!outcome.is_collision());
        assert!(outcome.closest_distance_km() > 1.5 * AU_KM);
    }

    #[test]
    fn cancelled_search_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = CollisionSearch::default().run_until_cancelled(
            &flyby(5_000.0),
            &Parked,
            J2000,
            &cancel,
        );
        assert!(outcome.is_none());
    }

    #[test]
    fn uncancelled_search_matches_plain_run() {
        let search = CollisionSearch::default();
        let target = flyby(5_000.0);
        let plain = search.run(&target, &Parked, J2000);
        let guarded = search.run_until_cancelled(
            &target,
            &Parked,
            J2000,
            &CancellationToken::new(),
        );
        assert_eq!(guarded, Some(plain));
    }
}
