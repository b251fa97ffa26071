//! Continuous sphere-sphere collision and elastic response.
//!
//! Both bodies are assumed to move at their current velocity for the whole tick.
//! The first contact time is solved in closed form from `|x + v t| = r1 + r2` on
//! the half-open interval `[0, dt)`, so a contact landing exactly on the tick
//! boundary is left to the next tick. On impact the next state of both bodies is
//! overwritten with the post-collision motion for the rest of the tick.

use ultraviolet::DVec3;

use crate::body::{Body, Kinematics, Shape};

/// Earliest time in `[0, dt)` at which two spheres separated by `x`, with
/// relative velocity `v` and combined radius `k`, touch.
pub fn time_of_impact(x: DVec3, v: DVec3, k: f64, dt: f64) -> Option<f64> {
    let a = v.mag_sq();
    let b = 2.0 * x.dot(v);
    let c = x.mag_sq() - k * k;
    let in_tick = |t: f64| (0.0..dt).contains(&t);

    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        return Some(-c / b).filter(|&t| in_tick(t));
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    [t1.min(t2), t1.max(t2)].into_iter().find(|&t| in_tick(t))
}

/// One-dimensional elastic collision of two masses with velocities `u1`, `u2`
/// along a shared axis. Returns the velocities after impact.
pub fn elastic_normal_velocities(m1: f64, u1: f64, m2: f64, u2: f64) -> (f64, f64) {
    let total = m1 + m2;
    let u1_after = (2.0 * m2 * u2 + u1 * (m1 - m2)) / total;
    let u2_after = (2.0 * m1 * u1 + u2 * (m2 - m1)) / total;
    (u1_after, u2_after)
}

/// Resolves a candidate pair. Returns the time of impact if the pair collided
/// during the tick; the next state of both bodies is rewritten in that case.
///
/// Only spheres collide. Pairs involving a point body are skipped.
pub fn collide(a: &mut Body, b: &mut Body, dt: f64) -> Option<f64> {
    match (a.shape(), b.shape()) {
        (Shape::Sphere { radius: r1 }, Shape::Sphere { radius: r2 }) => {
            collide_spheres(a, b, r1 as f64 + r2 as f64, dt)
        }
        (Shape::Point, Shape::Sphere { .. })
        | (Shape::Sphere { .. }, Shape::Point)
        | (Shape::Point, Shape::Point) => None,
    }
}

fn collide_spheres(a: &mut Body, b: &mut Body, k: f64, dt: f64) -> Option<f64> {
    let (x1, v1, m1) = (a.position(), a.velocity(), a.mass());
    let (x2, v2, m2) = (b.position(), b.velocity(), b.mass());

    let t = time_of_impact(x1 - x2, v1 - v2, k, dt)?;

    let c1 = x1 + v1 * t;
    let c2 = x2 + v2 * t;
    let n = (c2 - c1).normalized();

    // Speeds along the line of centers, positive toward the other sphere for `a`.
    let u1 = v1.dot(n);
    let u2 = v2.dot(n);
    if u1 < 0.0 && u2 > 0.0 {
        return None;
    }

    let (u1_after, u2_after) = elastic_normal_velocities(m1, u1, m2, u2);
    let w1 = v1 + n * (u1_after - u1);
    let w2 = v2 + n * (u2_after - u2);

    let rest = dt - t;
    *a.next_mut() = Kinematics::new(c1 + w1 * rest, w1);
    *b.next_mut() = Kinematics::new(c2 + w2 * rest, w2);
    Some(t)
}

/// Mutable references to two distinct elements of `bodies`.
///
/// Panics if `i == j` or either index is out of bounds.
pub fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    assert_ne!(i, j, "a body cannot collide with itself");
    if i < j {
        let (head, tail) = bodies.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
