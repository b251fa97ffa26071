//! Sweep-and-prune broad phase along the X axis.
//!
//! Bodies are projected onto X using the bounding box of their *next* state. The
//! sorted endpoint list persists between ticks, so the insertion sort runs in
//! close to linear time while bodies move coherently. Candidates found by the
//! sweep are filtered with a full 3-D box test before being reported.

use crate::body::{Aabb, Body};

/// One end of a body's X interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Index of the body in the slice passed to [`BroadPhase::sweep`].
    pub body: usize,
    pub is_min: bool,
}

impl Endpoint {
    #[inline]
    fn value(&self, boxes: &[Aabb]) -> f64 {
        let aabb = &boxes[self.body];
        if self.is_min { aabb.min.x } else { aabb.max.x }
    }
}

/// Sweep-and-prune state owned by one world.
#[derive(Clone, Debug, Default)]
pub struct BroadPhase {
    endpoints: Vec<Endpoint>,
    active: Vec<usize>,
    boxes: Vec<Aabb>,
    pairs: Vec<(usize, usize)>,
    /// Generation of the body set the endpoint list was built for.
    generation: Option<u64>,
}

impl BroadPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every endpoint, active entry and pending pair.
    pub fn clear(&mut self) {
        self.endpoints.clear();
        self.active.clear();
        self.boxes.clear();
        self.pairs.clear();
        self.generation = None;
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Candidate pairs found by the last sweep.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Rebuilds the endpoint list when the body set differs from the one it was
    /// built for. Returns whether a rebuild happened.
    pub fn refresh(&mut self, body_count: usize, generation: u64) -> bool {
        if self.generation == Some(generation) && self.endpoints.len() == 2 * body_count {
            return false;
        }
        self.clear();
        self.endpoints.reserve(2 * body_count);
        for body in 0..body_count {
            self.endpoints.push(Endpoint { body, is_min: true });
            self.endpoints.push(Endpoint { body, is_min: false });
        }
        self.generation = Some(generation);
        true
    }

    /// Sorts the endpoints against the bodies' next-state boxes and sweeps them,
    /// returning every pair `(i, j)` with `i < j` whose boxes overlap.
    ///
    /// `refresh` must have been called for the current body set.
    pub fn sweep(&mut self, bodies: &[Body]) -> &[(usize, usize)] {
        debug_assert_eq!(self.endpoints.len(), 2 * bodies.len(), "stale endpoint list");

        self.boxes.clear();
        self.boxes.extend(bodies.iter().map(Body::next_aabb));
        insertion_sort(&mut self.endpoints, &self.boxes);

        self.active.clear();
        self.pairs.clear();
        for endpoint in &self.endpoints {
            let body = endpoint.body;
            if endpoint.is_min {
                let aabb = &self.boxes[body];
                for &other in &self.active {
                    if aabb.overlaps(&self.boxes[other]) {
                        self.pairs.push((other.min(body), other.max(body)));
                    }
                }
                self.active.push(body);
            } else if let Some(pos) = self.active.iter().position(|&b| b == body) {
                self.active.remove(pos);
            }
        }
        &self.pairs
    }
}

/// Min endpoints sort before max endpoints at equal X so touching intervals meet.
#[inline]
fn precedes(a: &Endpoint, b: &Endpoint, boxes: &[Aabb]) -> bool {
    let (xa, xb) = (a.value(boxes), b.value(boxes));
    xa < xb || (xa == xb && a.is_min && !b.is_min)
}

/// Stable in-place insertion sort of the endpoints by X.
fn insertion_sort(endpoints: &mut [Endpoint], boxes: &[Aabb]) {
    for i in 1..endpoints.len() {
        let current = endpoints[i];
        let mut j = i;
        while j > 0 && precedes(&current, &endpoints[j - 1], boxes) {
            endpoints[j] = endpoints[j - 1];
            j -= 1;
        }
        endpoints[j] = current;
    }
}
