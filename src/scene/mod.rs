//! Scene Graph
//!
//! Node hierarchy, dirty-checked transforms, activation lifecycle, and
//! gesture routing. Nodes live in an arena owned by [`Scene`] and are
//! addressed by generational [`NodeHandle`]s, so stale handles fail lookups
//! instead of dangling.

pub mod gesture;
pub mod node;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use gesture::{
    DEFAULT_TOUCH_SLOP, TapHandler, TouchAction, TouchEvent, TouchEventSystem, TouchHandler,
};
pub use node::{Node, NodeListener};
pub use scene::{HitResult, Scene};
pub use transform::{DirtyFlags, Transform};

/// Generational handle to a node in a scene's arena.
pub type NodeHandle = thunderdome::Index;

/// Frame timing handed to update listeners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the previous frame.
    pub delta_seconds: f32,
    /// Seconds since the scene started updating.
    pub total_seconds: f64,
}
