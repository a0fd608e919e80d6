//! Collision primitives, colliders, and the scene-wide collision registry.
//!
//! - [`Ray`] / [`Plane`] / [`RayHit`]: closed-form ray primitives
//! - [`Sphere`] / [`Box3`] / [`CollisionShape`]: the closed shape set with
//!   change counters
//! - [`Collider`]: binds a shape to a transform source with a lazily cached
//!   world-space copy
//! - [`CollisionSystem`]: the registered set and its linear-scan queries

pub mod collider;
pub mod ray;
pub mod shape;
pub mod system;

pub use collider::Collider;
pub use ray::{Plane, Ray, RayHit};
pub use shape::{Box3, CollisionShape, Sphere};
pub use system::{ColliderKey, CollisionSystem};

use glam::Affine3A;

use crate::scene::NodeHandle;

/// The capability of producing a world-space model matrix on demand.
///
/// Collision queries resolve collider transforms through this trait instead
/// of borrowing the whole scene, so any entity that can answer for a node
/// handle (the scene's node arena, a camera rig, a test fixture) can drive
/// them. [`crate::scene::transform_system::NodeTransforms`] is the standard
/// implementation over the scene graph.
pub trait TransformProvider {
    /// The node's current world model matrix, or `None` if the handle is
    /// unknown.
    fn world_matrix(&mut self, node: NodeHandle) -> Option<Affine3A>;

    /// A counter bumped whenever the node's world transform changes.
    /// Unknown handles report 0.
    fn world_revision(&self, node: NodeHandle) -> u64;
}
