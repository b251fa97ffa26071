use std::sync::OnceLock;

use ultraviolet::{DMat4, DRotor3, DVec3};

/// Position and velocity of a body at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Kinematics {
    pub position: DVec3,
    pub velocity: DVec3,
}

impl Kinematics {
    pub fn new(position: DVec3, velocity: DVec3) -> Self {
        Self { position, velocity }
    }
}

/// Collision shape of a body.
///
/// `Point` bodies attract and are attracted but never collide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Point,
    Sphere { radius: f32 },
}

impl Shape {
    /// Half extent of the bounding box along every axis.
    pub fn half_extent(&self) -> f64 {
        match *self {
            Shape::Point => 0.0,
            Shape::Sphere { radius } => radius as f64,
        }
    }

    /// Axis-aligned box of the shape centered at `center`.
    pub fn aabb(&self, center: DVec3) -> Aabb {
        let e = DVec3::broadcast(self.half_extent());
        Aabb::new(center - e, center + e)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Closed-interval overlap on all three axes.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// A simulated body with double-buffered kinematics.
///
/// `current` is the authoritative state read by gravity and collision code during a
/// tick; `next` is the staging area they write. [`Body::commit`] closes the buffer.
#[derive(Debug)]
pub struct Body {
    mass: f64,
    shape: Shape,
    current: Kinematics,
    next: Kinematics,
    rotation: DRotor3,
    scale: DVec3,
    /// Memoized `T * R * S`, emptied whenever position, rotation or scale change.
    transform: OnceLock<DMat4>,
}

impl Clone for Body {
    fn clone(&self) -> Self {
        Self {
            mass: self.mass,
            shape: self.shape,
            current: self.current,
            next: self.next,
            rotation: self.rotation,
            scale: self.scale,
            transform: OnceLock::new(),
        }
    }
}

impl Body {
    /// Creates a body at rest in its staging buffer (`next == current`),
    /// with identity rotation and unit scale.
    pub fn new(mass: f64, position: DVec3, velocity: DVec3, shape: Shape) -> Self {
        debug_assert!(mass > 0.0, "body mass must be positive, got {mass}");
        let state = Kinematics::new(position, velocity);
        Self {
            mass,
            shape,
            current: state,
            next: state,
            rotation: DRotor3::identity(),
            scale: DVec3::one(),
            transform: OnceLock::new(),
        }
    }

    /// Creates a sphere whose mesh scale matches its radius, assuming a unit mesh.
    pub fn sphere(mass: f64, position: DVec3, velocity: DVec3, radius: f32) -> Self {
        Self::new(mass, position, velocity, Shape::Sphere { radius })
            .with_scale(DVec3::broadcast(radius as f64))
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Sphere { radius } => Some(radius),
            Shape::Point => None,
        }
    }

    pub fn current(&self) -> &Kinematics {
        &self.current
    }

    pub fn next(&self) -> &Kinematics {
        &self.next
    }

    /// Mutable access to the staging buffer. Does not touch the transform cache.
    pub fn next_mut(&mut self) -> &mut Kinematics {
        &mut self.next
    }

    pub fn position(&self) -> DVec3 {
        self.current.position
    }

    pub fn velocity(&self) -> DVec3 {
        self.current.velocity
    }

    pub fn rotation(&self) -> DRotor3 {
        self.rotation
    }

    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    /// Copies the staging buffer into the current state.
    pub fn commit(&mut self) {
        if self.current.position != self.next.position {
            self.transform = OnceLock::new();
        }
        self.current = self.next;
    }

    pub fn set_rotation(&mut self, rotation: DRotor3) {
        self.rotation = rotation;
        self.transform = OnceLock::new();
    }

    pub fn set_scale(&mut self, scale: DVec3) {
        self.scale = scale;
        self.transform = OnceLock::new();
    }

    /// Bounding box around the staged position.
    pub fn next_aabb(&self) -> Aabb {
        self.shape.aabb(self.next.position)
    }

    /// Bounding box around the current position.
    pub fn aabb(&self) -> Aabb {
        self.shape.aabb(self.current.position)
    }

    /// Model matrix for rendering, composed as translation * rotation * scale.
    pub fn model_transform(&self) -> DMat4 {
        *self.transform.get_or_init(|| {
            DMat4::from_translation(self.current.position)
                * self.rotation.into_matrix().into_homogeneous()
                * DMat4::from_nonuniform_scale(self.scale)
        })
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.current.velocity.mag_sq()
    }

    pub fn momentum(&self) -> DVec3 {
        self.current.velocity * self.mass
    }
}
