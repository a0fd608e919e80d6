//! Scene-graph transform and collision core for AR applications.
//!
//! The crate provides the spatial backbone an AR host needs between its
//! tracking layer and its renderer: a node hierarchy with dirty-checked,
//! lazily resolved world transforms; a collision system for hit-testing
//! and overlap queries; and per-frame update and gesture routing. The
//! renderer itself stays behind the [`RenderBinding`] trait.
//!
//! ```
//! use arbor::collision::{Ray, Sphere};
//! use arbor::Scene;
//! use glam::Vec3;
//!
//! let mut scene = Scene::new();
//! let anchor = scene.create_node_with_name("anchor");
//! scene.attach_to_root(anchor).unwrap();
//! scene.set_local_position(anchor, Vec3::new(0.0, 0.0, -2.0));
//! scene.set_collision_shape(anchor, Some(Sphere::new(Vec3::ZERO, 0.5).into()));
//!
//! let hit = scene.hit_test(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap();
//! assert_eq!(hit.node, anchor);
//! ```

pub mod collision;
pub mod errors;
pub mod math;
pub mod render;
pub mod scene;

pub use collision::{Box3, Collider, CollisionShape, CollisionSystem, Plane, Ray, RayHit, Sphere};
pub use errors::SceneError;
pub use render::{LightInstance, NullBinding, RenderBinding, RenderableInstance};
pub use scene::{
    FrameTime, HitResult, Node, NodeHandle, NodeListener, Scene, TouchAction, TouchEvent,
    Transform,
};
