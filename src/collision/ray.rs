//! Rays, hits, and the infinite plane primitive.

use glam::Vec3;

use crate::math::EPSILON;

/// A half-line with an origin and a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Creates a ray. The direction is normalized; a zero direction falls
    /// back to `-Z`.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize_or_neg_z(direction),
        }
    }

    /// Ray origin.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Normalized ray direction.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Moves the origin.
    #[inline]
    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
    }

    /// Replaces the direction, normalizing it.
    #[inline]
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = normalize_or_neg_z(direction);
    }

    /// The point `origin + direction * distance`.
    #[inline]
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

fn normalize_or_neg_z(v: Vec3) -> Vec3 {
    if v.length_squared() < EPSILON {
        Vec3::NEG_Z
    } else {
        v.normalize()
    }
}

/// Result of a ray intersection test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RayHit {
    /// Distance along the ray to the hit.
    pub distance: f32,
    /// World-space hit location.
    pub point: Vec3,
}

/// An infinite plane through `center` with a normalized `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub center: Vec3,
    /// Plane normal (normalized by the constructor).
    pub normal: Vec3,
}

impl Plane {
    /// Creates a plane; the normal is normalized.
    #[must_use]
    pub fn new(center: Vec3, normal: Vec3) -> Self {
        Self {
            center,
            normal: normalize_or_neg_z(normal),
        }
    }

    /// Intersects a ray with the plane.
    ///
    /// Rays parallel to the plane (denominator below [`EPSILON`]) and
    /// intersections behind the ray origin produce no hit.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        let denominator = ray.direction().dot(self.normal);
        if denominator.abs() < EPSILON {
            return None;
        }

        let distance = (self.center - ray.origin()).dot(self.normal) / denominator;
        if distance < 0.0 {
            return None;
        }

        Some(RayHit {
            distance,
            point: ray.point_at(distance),
        })
    }
}
