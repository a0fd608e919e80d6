//! Touch Event System
//!
//! Tap tracking and touch bubbling for the scene graph. The host translates
//! platform motion events into [`TouchEvent`]s plus a world-space pick ray;
//! the scene resolves the ray to a node and hands both to this system.
//!
//! Routing rules:
//!
//! - Raw touch handlers bubble from the hit node toward the root; the first
//!   handler returning `true` consumes the event (and cancels any tap in
//!   flight).
//! - If nothing consumes it, a `Down` over a node with a tap handler
//!   (searched with the same bubbling walk) begins tracking. `Move`/`Up`
//!   keep the gesture alive while the event still resolves to the tracked
//!   node or stays within the touch slop; otherwise the gesture is
//!   abandoned without firing. A valid `Up` fires the tap exactly once.

use glam::Vec2;

use crate::scene::{NodeHandle, Scene};

/// Touch-slop fallback when the host provides no device-specific value.
pub const DEFAULT_TOUCH_SLOP: f32 = 8.0;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// Pointer went down.
    Down,
    /// Pointer moved while down.
    Move,
    /// Pointer was released.
    Up,
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// Event phase.
    pub action: TouchAction,
    /// Screen-space pointer position.
    pub position: Vec2,
}

/// Raw touch callback; returns `true` to consume the event.
pub type TouchHandler = Box<dyn FnMut(&TouchEvent) -> bool>;

/// Tap callback, invoked with the tapped node and the release position.
pub type TapHandler = Box<dyn FnMut(NodeHandle, Vec2)>;

#[derive(Debug, Clone, Copy)]
struct TapTracking {
    node: NodeHandle,
    down_position: Vec2,
}

/// Per-scene gesture state.
#[derive(Default)]
pub struct TouchEventSystem {
    touch_slop: Option<f32>,
    tracking: Option<TapTracking>,
}

impl TouchEventSystem {
    /// Creates the system with the default touch slop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective touch slop in screen units.
    #[must_use]
    pub fn touch_slop(&self) -> f32 {
        self.touch_slop.unwrap_or(DEFAULT_TOUCH_SLOP)
    }

    /// Overrides the touch slop with a device-specific value.
    pub fn set_touch_slop(&mut self, slop: f32) {
        self.touch_slop = Some(slop);
    }

    /// Whether a tap gesture is currently being tracked.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    /// Routes one event. `hit` is the node the event's pick ray resolved
    /// to, if any. Returns `true` if the event was consumed by a handler,
    /// started a tracked gesture, or completed a tap.
    pub(crate) fn dispatch(
        &mut self,
        scene: &mut Scene,
        event: &TouchEvent,
        hit: Option<NodeHandle>,
    ) -> bool {
        let chain = scene.ancestor_chain(hit);

        for &handle in &chain {
            let Some(node) = scene.get_node_mut(handle) else {
                continue;
            };
            if let Some(handler) = node.on_touch.as_mut()
                && handler(event)
            {
                self.tracking = None;
                return true;
            }
        }

        match event.action {
            TouchAction::Down => {
                self.tracking = chain
                    .iter()
                    .copied()
                    .find(|&h| scene.get_node(h).is_some_and(|n| n.on_tap.is_some()))
                    .map(|node| TapTracking {
                        node,
                        down_position: event.position,
                    });
                self.tracking.is_some()
            }
            TouchAction::Move | TouchAction::Up => {
                let Some(tracking) = self.tracking else {
                    return false;
                };
                let within_slop =
                    (event.position - tracking.down_position).length() <= self.touch_slop();
                let still_on_node = chain.contains(&tracking.node);

                if !within_slop && !still_on_node {
                    self.tracking = None;
                    return false;
                }
                if event.action == TouchAction::Up {
                    self.tracking = None;
                    if let Some(node) = scene.get_node_mut(tracking.node)
                        && let Some(handler) = node.on_tap.as_mut()
                    {
                        handler(tracking.node, event.position);
                    }
                    return true;
                }
                true
            }
        }
    }
}
