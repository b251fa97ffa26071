use crate::body::{Body, Shape};
use crate::config::{BeltConfig, CentralBodyConfig};
use crate::gravity::G;
use std::f64::consts::{PI, TAU};
use ultraviolet::DVec3;

/// Uniform sample in `[base - jitter, base + jitter)`.
fn jittered(rng: &mut fastrand::Rng, base: f64, jitter: f64) -> f64 {
    base + jitter * (2.0 * rng.f64() - 1.0)
}

/// Random direction from spherical angles.
/// Denser toward the poles; not uniform on the sphere.
pub fn random_unit_vector(rng: &mut fastrand::Rng) -> DVec3 {
    let phi = rng.f64() * TAU;
    let theta = rng.f64() * PI;
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    DVec3::new(sin_t * cos_p, sin_t * sin_p, cos_t).normalized()
}

/// A unit vector perpendicular to `v`.
pub fn normal_to(v: DVec3) -> DVec3 {
    let mut normal = DVec3::new(v.z, v.z, -v.x - v.y);
    if normal == DVec3::zero() {
        normal = DVec3::new(-v.y - v.z, v.x, v.x);
    }
    normal.normalized()
}

/// Builds the central body from its configuration.
/// It collides only when a radius is configured.
pub fn central_body(config: &CentralBodyConfig) -> Body {
    let shape = match config.radius {
        Some(radius) => Shape::Sphere { radius },
        None => Shape::Point,
    };
    Body::new(config.mass, config.position(), config.velocity(), shape)
        .with_scale(DVec3::broadcast(config.scale))
}

/// Generates a ring of spheres orbiting `center` in the plane perpendicular to `up`.
/// - Orbit radius, mass and sphere radius are drawn uniformly around their configured values.
/// - Speed is the circular orbital speed `sqrt(G * M / r)` scaled by a random factor,
///   so orbits are near-circular but mostly eccentric.
/// - Velocity is tangent to the ring, turning counter-clockwise around `up`.
pub fn asteroid_belt(
    rng: &mut fastrand::Rng,
    belt: &BeltConfig,
    center: DVec3,
    central_mass: f64,
    up: DVec3,
) -> Vec<Body> {
    let up = up.normalized();
    let in_plane = normal_to(up);
    let e1 = in_plane.cross(up).normalized();
    let e2 = -in_plane;

    let mut bodies = Vec::with_capacity(belt.count);
    for _ in 0..belt.count {
        let theta = rng.f64() * TAU;
        let r = jittered(rng, belt.orbit_radius, belt.orbit_radius_jitter);
        let (sin, cos) = theta.sin_cos();
        let pos = center + e1 * (r * cos) + e2 * (r * sin);

        let mass = jittered(rng, belt.mass, belt.mass_jitter);
        let coef = belt.speed_factor_min + rng.f64() * belt.speed_factor_span;
        let speed = (G * central_mass / r).sqrt() * coef;
        let vel = up.cross(pos - center).normalized() * speed;
        let radius = jittered(rng, belt.radius as f64, belt.radius_jitter as f64) as f32;

        bodies.push(Body::sphere(mass, pos, vel, radius));
    }

    bodies
}
