//! Fixed-step integrators that stage a body's next state under point-mass gravity.
//!
//! Integrators read only the *current* state of the body and of its sources and
//! write the body's *next* state, so bodies in a batch are independent and may be
//! advanced in any order, or in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::gravity::acceleration_at;

/// Advances one body's next state by `dt` under the gravity of `sources`.
pub trait Integrate: Sync {
    fn advance(&self, body: &mut Body, sources: &[Body], dt: f64);

    /// Applies [`Integrate::advance`] to every body in `bodies`.
    fn advance_all(&self, bodies: &mut [Body], sources: &[Body], dt: f64, parallel: bool) {
        if parallel {
            bodies
                .par_iter_mut()
                .for_each(|body| self.advance(body, sources, dt));
        } else {
            bodies
                .iter_mut()
                .for_each(|body| self.advance(body, sources, dt));
        }
    }
}

/// Explicit first-order Euler. Overwrites the next state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euler;

impl Integrate for Euler {
    fn advance(&self, body: &mut Body, sources: &[Body], dt: f64) {
        let x1 = body.position();
        let v1 = body.velocity();
        let a1 = acceleration_at(x1, sources);

        let next = body.next_mut();
        next.position = x1 + v1 * dt;
        next.velocity = v1 + a1 * dt;
    }
}

/// Classical fourth-order Runge-Kutta.
///
/// The weighted increments are *added* to the next state rather than assigned.
/// Within a tick the next state starts equal to the current one (the commit
/// invariant), so a single pass stages `current + delta`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RungeKutta4;

impl Integrate for RungeKutta4 {
    fn advance(&self, body: &mut Body, sources: &[Body], dt: f64) {
        let half = 0.5 * dt;

        let x1 = body.position();
        let v1 = body.velocity();
        let a1 = acceleration_at(x1, sources);

        let x2 = x1 + v1 * half;
        let v2 = v1 + a1 * half;
        let a2 = acceleration_at(x2, sources);

        let x3 = x1 + v2 * half;
        let v3 = v1 + a2 * half;
        let a3 = acceleration_at(x3, sources);

        let x4 = x1 + v3 * dt;
        let v4 = v1 + a3 * dt;
        let a4 = acceleration_at(x4, sources);

        let w = dt / 6.0;
        let next = body.next_mut();
        next.position += (v1 + v2 * 2.0 + v3 * 2.0 + v4) * w;
        next.velocity += (a1 + a2 * 2.0 + a3 * 2.0 + a4) * w;
    }
}

/// Selectable integration scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorKind {
    #[serde(rename = "euler")]
    Euler,
    #[default]
    #[serde(rename = "rk4")]
    RungeKutta4,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 2] = [IntegratorKind::RungeKutta4, IntegratorKind::Euler];

    pub fn name(&self) -> &'static str {
        match self {
            IntegratorKind::Euler => "euler",
            IntegratorKind::RungeKutta4 => "rk4",
        }
    }
}

impl std::str::FromStr for IntegratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euler" => Ok(IntegratorKind::Euler),
            "rk4" | "runge-kutta" | "rungekutta" => Ok(IntegratorKind::RungeKutta4),
            other => Err(format!("unknown integrator `{other}` (expected `euler` or `rk4`)")),
        }
    }
}

impl Integrate for IntegratorKind {
    fn advance(&self, body: &mut Body, sources: &[Body], dt: f64) {
        match self {
            IntegratorKind::Euler => Euler.advance(body, sources, dt),
            IntegratorKind::RungeKutta4 => RungeKutta4.advance(body, sources, dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Shape;
    use crate::gravity::G;
    use ultraviolet::DVec3;

    fn fixed_source(mass: f64) -> Body {
        Body::new(mass, DVec3::zero(), DVec3::zero(), Shape::Point)
    }

    /// Integrates one satellite around a fixed source and returns the final
    /// distance to its start position, relative to the orbit radius.
    fn circular_orbit_drift(kind: IntegratorKind) -> f64 {
        let mass = 1000.0;
        let r = 10.0;
        let speed = (G * mass / r).sqrt();
        let period = std::f64::consts::TAU * r / speed;
        let steps = 2000;
        let dt = period / steps as f64;

        let sources = [fixed_source(mass)];
        let start = DVec3::new(r, 0.0, 0.0);
        let mut body = Body::new(1.0, start, DVec3::new(0.0, 0.0, speed), Shape::Point);

        for _ in 0..steps {
            kind.advance(&mut body, &sources, dt);
            body.commit();
        }
        (body.position() - start).mag() / r
    }

    #[test]
    fn euler_stages_first_order_step() {
        let sources = [fixed_source(10.0)];
        let mut body = Body::new(1.0, DVec3::new(0.0, 2.0, 0.0), DVec3::new(1.0, 0.0, 0.0), Shape::Point);
        Euler.advance(&mut body, &sources, 0.5);

        let a = G * 10.0 / 4.0;
        assert_eq!(body.next().position, DVec3::new(0.5, 2.0, 0.0));
        assert!((body.next().velocity - DVec3::new(1.0, -a * 0.5, 0.0)).mag() < 1e-12);
        // current state untouched until commit
        assert_eq!(body.position(), DVec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn euler_overwrites_previous_staging() {
        let sources = [fixed_source(10.0)];
        let mut body = Body::new(1.0, DVec3::new(0.0, 2.0, 0.0), DVec3::new(1.0, 0.0, 0.0), Shape::Point);
        Euler.advance(&mut body, &sources, 0.5);
        let first = *body.next();
        Euler.advance(&mut body, &sources, 0.5);
        assert_eq!(*body.next(), first);
    }

    #[test]
    fn rk4_without_sources_is_linear_motion() {
        let mut body = Body::new(1.0, DVec3::new(1.0, 1.0, 1.0), DVec3::new(2.0, 0.0, -1.0), Shape::Point);
        RungeKutta4.advance(&mut body, &[], 0.25);
        assert!((body.next().position - DVec3::new(1.5, 1.0, 0.75)).mag() < 1e-12);
        assert_eq!(body.next().velocity, DVec3::new(2.0, 0.0, -1.0));
    }

    #[test]
    fn rk4_accumulates_into_next_state() {
        let sources = [fixed_source(500.0)];
        let mut once = Body::new(1.0, DVec3::new(5.0, 0.0, 0.0), DVec3::new(0.0, 3.0, 0.0), Shape::Point);
        let mut twice = once.clone();

        RungeKutta4.advance(&mut once, &sources, 0.1);
        let delta_pos = once.next().position - once.position();
        let delta_vel = once.next().velocity - once.velocity();

        RungeKutta4.advance(&mut twice, &sources, 0.1);
        RungeKutta4.advance(&mut twice, &sources, 0.1);

        let expected_pos = twice.position() + delta_pos * 2.0;
        let expected_vel = twice.velocity() + delta_vel * 2.0;
        assert!((twice.next().position - expected_pos).mag() < 1e-9);
        assert!((twice.next().velocity - expected_vel).mag() < 1e-9);
    }

    #[test]
    fn rk4_after_commit_starts_from_current_state() {
        let sources = [fixed_source(500.0)];
        let mut body = Body::new(1.0, DVec3::new(5.0, 0.0, 0.0), DVec3::new(0.0, 3.0, 0.0), Shape::Point);

        RungeKutta4.advance(&mut body, &sources, 0.1);
        body.commit();
        let mut reference = Body::new(1.0, body.position(), body.velocity(), Shape::Point);

        RungeKutta4.advance(&mut body, &sources, 0.1);
        RungeKutta4.advance(&mut reference, &sources, 0.1);
        assert_eq!(body.next(), reference.next());
    }

    #[test]
    fn rk4_closes_circular_orbit() {
        let drift = circular_orbit_drift(IntegratorKind::RungeKutta4);
        assert!(drift < 0.01, "rk4 drift {drift}");
    }

    #[test]
    fn euler_drifts_more_than_rk4() {
        let rk4 = circular_orbit_drift(IntegratorKind::RungeKutta4);
        let euler = circular_orbit_drift(IntegratorKind::Euler);
        assert!(euler > 10.0 * rk4, "euler {euler} vs rk4 {rk4}");
        assert!(euler > 1e-3, "euler drift {euler}");
    }

    #[test]
    fn parallel_batch_matches_sequential() {
        let sources = [fixed_source(2000.0)];
        let make = || {
            (1..=64)
                .map(|i| {
                    let r = 20.0 + i as f64;
                    Body::new(1.0, DVec3::new(r, 0.0, 0.0), DVec3::new(0.0, 0.0, 5.0), Shape::Point)
                })
                .collect::<Vec<_>>()
        };
        let mut seq = make();
        let mut par = make();

        IntegratorKind::RungeKutta4.advance_all(&mut seq, &sources, 0.02, false);
        IntegratorKind::RungeKutta4.advance_all(&mut par, &sources, 0.02, true);

        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn kind_parses_and_deserializes() {
        assert_eq!("Euler".parse::<IntegratorKind>(), Ok(IntegratorKind::Euler));
        assert_eq!("rk4".parse::<IntegratorKind>(), Ok(IntegratorKind::RungeKutta4));
        assert!("verlet".parse::<IntegratorKind>().is_err());

        let kind: IntegratorKind = serde_yaml::from_str("euler").unwrap();
        assert_eq!(kind, IntegratorKind::Euler);
        assert_eq!(IntegratorKind::default(), IntegratorKind::RungeKutta4);
    }
}
