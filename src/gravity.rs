//! Point-mass gravity.
//!
//! Every [`Body`] can act as a gravity source. Accelerations from several sources
//! are summed. A point that coincides with a source yields NaN: callers must never
//! place a body exactly on a gravity source. No softening is applied, since
//! clamping the distance would change trajectories.

use ultraviolet::DVec3;

use crate::body::Body;

/// Gravitational constant used by the engine. Not the SI value.
pub const G: f64 = 9.81;

/// Acceleration at `point` due to a single `source`.
#[inline]
pub fn acceleration_from(point: DVec3, source: &Body) -> DVec3 {
    let dir = source.position() - point;
    let r = dir.mag();
    dir.normalized() * (G * source.mass() / (r * r))
}

/// Sum of the accelerations at `point` due to every body in `sources`.
pub fn acceleration_at<'a, I>(point: DVec3, sources: I) -> DVec3
where
    I: IntoIterator<Item = &'a Body>,
{
    sources
        .into_iter()
        .fold(DVec3::zero(), |acc, source| acc + acceleration_from(point, source))
}
