//! Mean anomaly propagation, Kepler's equation and orbital-plane projection.

use std::f64::consts::{PI, TAU};

use tracing::debug;

use crate::orbit::elements::OrbitalElements;
use crate::orbit::time::JulianDate;

/// Newton-Raphson stops once a correction is smaller than this (radians).
pub const KEPLER_TOLERANCE: f64 = 1e-6;

/// Upper bound on Newton-Raphson iterations.
pub const KEPLER_MAX_ITERATIONS: usize = 64;

/// Result of solving Kepler's equation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly (radians). Best available estimate when the solver
    /// did not converge.
    pub eccentric_anomaly: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Mean anomaly in degrees at `at`, normalized into `[0, 360)`.
///
/// Valid for instants before the epoch as well.
pub fn mean_anomaly_at(elements: &OrbitalElements, at: JulianDate) -> f64 {
    let elapsed = at - elements.epoch;
    normalize_degrees(elements.mean_motion * elapsed + elements.mean_anomaly)
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Solve `E - e*sin(E) = M` for the eccentric anomaly.
///
/// `mean_anomaly` is in radians. Newton-Raphson starts from `E = M`. When
/// that start does not converge within [`KEPLER_MAX_ITERATIONS`] steps, which
/// happens for eccentricities close to 1, it restarts from `E = π` in the same
/// revolution as `M`. The residual is convex on one side of `π` and concave on
/// the other, so the second start converges for every `0 <= e < 1`.
///
/// Degenerate input (`e >= 1`, NaN) returns the finite iterate with the
/// smallest residual, wrapped into `[0, 2π)`, with `converged == false`.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let first = newton(mean_anomaly, eccentricity, mean_anomaly);
    if first.converged {
        return first.finish(0);
    }

    let revolution = (mean_anomaly / TAU).floor() * TAU;
    let second = newton(mean_anomaly, eccentricity, revolution + PI);
    if second.converged {
        return second.finish(first.iterations);
    }

    let total = first.iterations + second.iterations;
    let best = if second.best_residual < first.best_residual {
        second
    } else {
        first
    };
    let mut solution = best.finish(0);
    solution.iterations = total;
    if solution.eccentric_anomaly.is_finite() {
        solution.eccentric_anomaly = solution.eccentric_anomaly.rem_euclid(TAU);
    }
    solution
}

/// One Newton-Raphson run from a fixed starting point.
struct NewtonRun {
    estimate: f64,
    best: f64,
    best_residual: f64,
    iterations: usize,
    converged: bool,
}

impl NewtonRun {
    /// `earlier` counts iterations spent on previous starting points.
    fn finish(self, earlier: usize) -> KeplerSolution {
        KeplerSolution {
            eccentric_anomaly: if self.converged { self.estimate } else { self.best },
            iterations: earlier + self.iterations,
            converged: self.converged,
        }
    }
}

fn newton(mean_anomaly: f64, eccentricity: f64, start: f64) -> NewtonRun {
    let mut run = NewtonRun {
        estimate: start,
        best: start,
        best_residual: f64::INFINITY,
        iterations: 0,
        converged: false,
    };

    while run.iterations < KEPLER_MAX_ITERATIONS {
        run.iterations += 1;
        let estimate = run.estimate;
        let residual = estimate - eccentricity * estimate.sin() - mean_anomaly;
        let slope = 1.0 - eccentricity * estimate.cos();

        if residual.abs() < run.best_residual {
            run.best = estimate;
            run.best_residual = residual.abs();
        }
        if !residual.is_finite() || slope.abs() < f64::EPSILON {
            break;
        }

        let delta = residual / slope;
        let next = estimate - delta;
        if !next.is_finite() {
            break;
        }
        run.estimate = next;

        if delta.abs() < KEPLER_TOLERANCE {
            run.converged = true;
            break;
        }
    }
    run
}

/// Eccentric anomaly (radians) for a mean anomaly in radians.
pub fn solve_eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let solution = solve_kepler(mean_anomaly, eccentricity);
    if !solution.converged {
        debug!(
            target: "orbit::kepler",
            mean_anomaly,
            eccentricity,
            iterations = solution.iterations,
            "kepler solver did not converge; using best estimate"
        );
    }
    solution.eccentric_anomaly
}

/// Position in the orbital plane with the Sun at the origin and the x axis
/// pointing at perihelion. Same length unit as `semi_major_axis`.
pub fn plane_coordinates(
    eccentric_anomaly: f64,
    eccentricity: f64,
    semi_major_axis: f64,
) -> (f64, f64) {
    let x = semi_major_axis * (eccentric_anomaly.cos() - eccentricity);
    let y = semi_major_axis
        * (1.0 - eccentricity * eccentricity).sqrt()
        * eccentric_anomaly.sin();
    (x, y)
}
