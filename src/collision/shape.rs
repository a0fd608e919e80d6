//! Collision shapes and their closed-form intersection tests.
//!
//! The shape set is closed and small, so pairwise tests are a plain `match`
//! over a tagged enum rather than double dispatch.
//!
//! Every mutating setter bumps the shape's change counter. Colliders compare
//! counters to detect staleness without deep comparison, so direct field
//! access is deliberately not offered.

use glam::{Affine3A, Mat3, Quat, Vec3};

use crate::collision::ray::{Ray, RayHit};
use crate::math::EPSILON;

/// A sphere described by a local-space center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    revision: u64,
}

impl Sphere {
    /// Creates a sphere. A zero radius is valid and simply never matches.
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            revision: 0,
        }
    }

    /// Sphere center.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Sphere radius.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Moves the center and bumps the change counter.
    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
        self.revision += 1;
    }

    /// Changes the radius and bumps the change counter.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
        self.revision += 1;
    }

    /// Ray intersection via the standard quadratic.
    ///
    /// Of the two roots the smaller positive one wins; if the origin is
    /// inside the sphere the larger root is used.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        let difference = ray.origin() - self.center;
        let direction = ray.direction();

        let a = direction.dot(direction);
        let b = 2.0 * difference.dot(direction);
        let c = difference.dot(difference) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let mut distance = (-b - root) / (2.0 * a);
        if distance < 0.0 {
            distance = (-b + root) / (2.0 * a);
        }
        if distance < 0.0 {
            return None;
        }

        Some(RayHit {
            distance,
            point: ray.point_at(distance),
        })
    }
}

/// An oriented box described by a local-space center, full extents, and
/// rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Box3 {
    center: Vec3,
    size: Vec3,
    rotation: Quat,
    revision: u64,
}

impl Box3 {
    /// Creates an axis-aligned box; orient it with [`Box3::set_rotation`].
    #[must_use]
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            size,
            rotation: Quat::IDENTITY,
            revision: 0,
        }
    }

    /// Box center.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Full extents along the box's local axes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Box orientation.
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Moves the center and bumps the change counter.
    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
        self.revision += 1;
    }

    /// Changes the extents and bumps the change counter.
    pub fn set_size(&mut self, size: Vec3) {
        self.size = size;
        self.revision += 1;
    }

    /// Reorients the box and bumps the change counter.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.revision += 1;
    }

    /// Ray intersection via the slab method against the box's three local
    /// axes.
    ///
    /// A ray parallel to a pair of faces short-circuits to a containment
    /// test against that slab's bounds.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        let axes = Mat3::from_quat(self.rotation);
        let half = self.size * 0.5;
        let delta = self.center - ray.origin();
        let direction = ray.direction();

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for (axis, extent) in [
            (axes.x_axis, half.x),
            (axes.y_axis, half.y),
            (axes.z_axis, half.z),
        ] {
            let e = axis.dot(delta);
            let f = axis.dot(direction);

            if f.abs() > EPSILON {
                let mut t1 = (e + extent) / f;
                let mut t2 = (e - extent) / f;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max || t_max < 0.0 {
                    return None;
                }
            } else if -e - extent > 0.0 || -e + extent < 0.0 {
                // Parallel to this pair of faces and outside the slab.
                return None;
            }
        }

        let distance = if t_min > 0.0 { t_min } else { t_max };
        if distance < 0.0 {
            return None;
        }

        Some(RayHit {
            distance,
            point: ray.point_at(distance),
        })
    }
}

/// The closed set of collision shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Sphere shape.
    Sphere(Sphere),
    /// Oriented box shape.
    Box(Box3),
}

impl CollisionShape {
    /// The shape's change counter, bumped on every mutating setter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        match self {
            Self::Sphere(s) => s.revision,
            Self::Box(b) => b.revision,
        }
    }

    /// Ray intersection against this shape.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        match self {
            Self::Sphere(s) => s.raycast(ray),
            Self::Box(b) => b.raycast(ray),
        }
    }

    /// Overlap test between two shapes.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Sphere(a), Self::Sphere(b)) => sphere_sphere(a, b),
            (Self::Sphere(s), Self::Box(b)) | (Self::Box(b), Self::Sphere(s)) => sphere_box(s, b),
            (Self::Box(a), Self::Box(b)) => box_box(a, b),
        }
    }

    /// Returns a copy of this shape transformed into world space.
    ///
    /// The box scales its extents per-axis by the decomposed world scale and
    /// composes rotations. The sphere scales its radius by the maximum
    /// absolute per-axis scale component, a conservative (never smaller)
    /// bound under non-uniform scale.
    #[must_use]
    pub fn transformed(&self, world: &Affine3A) -> Self {
        let (scale, rotation, _) = world.to_scale_rotation_translation();
        match self {
            Self::Sphere(s) => {
                let mut out = s.clone();
                out.center = world.transform_point3(s.center);
                out.radius = s.radius * scale.abs().max_element();
                Self::Sphere(out)
            }
            Self::Box(b) => {
                let mut out = b.clone();
                out.center = world.transform_point3(b.center);
                out.size = b.size * scale.abs();
                out.rotation = (rotation * b.rotation).normalize();
                Self::Box(out)
            }
        }
    }
}

impl From<Sphere> for CollisionShape {
    fn from(s: Sphere) -> Self {
        Self::Sphere(s)
    }
}

impl From<Box3> for CollisionShape {
    fn from(b: Box3) -> Self {
        Self::Box(b)
    }
}

fn sphere_sphere(a: &Sphere, b: &Sphere) -> bool {
    let radius_sum = a.radius + b.radius;
    (b.center - a.center).length_squared() <= radius_sum * radius_sum
}

fn sphere_box(sphere: &Sphere, b: &Box3) -> bool {
    // Closest point on the box to the sphere center, in box-local space.
    let local = b.rotation.inverse() * (sphere.center - b.center);
    let half = b.size * 0.5;
    let clamped = local.clamp(-half, half);
    (local - clamped).length_squared() <= sphere.radius * sphere.radius
}

/// Separating-axis test over the 15 candidate axes of two oriented boxes.
fn box_box(a: &Box3, b: &Box3) -> bool {
    let a_axes = Mat3::from_quat(a.rotation);
    let b_axes = Mat3::from_quat(b.rotation);
    let a_axis = [a_axes.x_axis, a_axes.y_axis, a_axes.z_axis];
    let b_axis = [b_axes.x_axis, b_axes.y_axis, b_axes.z_axis];
    let a_half = a.size * 0.5;
    let b_half = b.size * 0.5;
    let offset = b.center - a.center;

    let separated_along = |axis: Vec3| -> bool {
        // Near-zero axes come from cross products of parallel edges and
        // carry no new information.
        if axis.length_squared() < EPSILON {
            return false;
        }
        let ra = a_half.x * a_axis[0].dot(axis).abs()
            + a_half.y * a_axis[1].dot(axis).abs()
            + a_half.z * a_axis[2].dot(axis).abs();
        let rb = b_half.x * b_axis[0].dot(axis).abs()
            + b_half.y * b_axis[1].dot(axis).abs()
            + b_half.z * b_axis[2].dot(axis).abs();
        offset.dot(axis).abs() > ra + rb
    };

    for axis in a_axis {
        if separated_along(axis) {
            return false;
        }
    }
    for axis in b_axis {
        if separated_along(axis) {
            return false;
        }
    }
    for ea in a_axis {
        for eb in b_axis {
            if separated_along(ea.cross(eb)) {
                return false;
            }
        }
    }

    true
}
