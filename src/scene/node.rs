//! Scene-graph nodes.

use glam::Vec3;

use crate::collision::ColliderKey;
use crate::render::{LightInstance, RenderableInstance};
use crate::scene::gesture::{TapHandler, TouchHandler};
use crate::scene::transform::Transform;
use crate::scene::{FrameTime, NodeHandle, Scene};

/// Lifecycle hooks for external controllers (gesture and transformation
/// logic), registered per node instead of subclassing.
///
/// Listeners receive the owning [`Scene`] mutably; during dispatch the
/// node's listener list is temporarily taken out, so a listener that walks
/// its own node will not observe itself.
pub trait NodeListener {
    /// Fired exactly once when the node transitions to active.
    fn on_activated(&mut self, _scene: &mut Scene, _node: NodeHandle) {}

    /// Fired once per frame while the node is active.
    fn on_updated(&mut self, _scene: &mut Scene, _node: NodeHandle, _frame: &FrameTime) {}

    /// Fired exactly once when the node transitions away from active.
    fn on_deactivated(&mut self, _scene: &mut Scene, _node: NodeHandle) {}
}

/// One entry in the scene graph.
///
/// # Design
///
/// A node is hierarchy plus capability slots: an optional renderable
/// instance, an optional light instance, an optional collision shape (via a
/// collider key into the scene's collision system), and behavior hooks.
/// Specialized nodes are built by composition, never by subclassing.
///
/// # Hierarchy and lifetime
///
/// Parent and children are handles into the scene's arena; nothing outside
/// the arena owns a node. A node with no parent that is not a scene root is
/// *detached*: valid, queryable (transforms resolve against an identity
/// parent), but never active.
///
/// # Active status
///
/// `active == enabled && in_scene && (parent is a root slot || parent.active)`
/// — recomputed top-down by the scene after every mutation that can affect
/// it. Activation attaches the renderable/light/collider capabilities to
/// their subsystems; deactivation detaches them.
pub struct Node {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) name: String,

    pub(crate) transform: Transform,

    pub(crate) enabled: bool,
    pub(crate) active: bool,
    pub(crate) in_scene: bool,

    pub(crate) renderable: Option<RenderableInstance>,
    pub(crate) light: Option<LightInstance>,
    pub(crate) collider: Option<ColliderKey>,

    pub(crate) listeners: Vec<Box<dyn NodeListener>>,
    pub(crate) on_touch: Option<TouchHandler>,
    pub(crate) on_tap: Option<TapHandler>,
}

impl Node {
    /// Creates a detached, enabled node with an identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            name: String::new(),
            transform: Transform::new(),
            enabled: true,
            active: false,
            in_scene: false,
            renderable: None,
            light: None,
            collider: None,
            listeners: Vec::new(),
            on_touch: None,
            on_tap: None,
        }
    }

    /// Creates a detached node with a name. Names are not unique.
    #[must_use]
    pub fn with_name(name: &str) -> Self {
        let mut node = Self::new();
        node.name = name.to_owned();
        node
    }

    /// Parent handle, if attached below another node.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Child handles in insertion order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Node name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read access to the transform component. All writes go through the
    /// scene so dirtiness propagates to descendants.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The node's forward axis (`-Z`) in local space.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.transform.rotation * Vec3::NEG_Z
    }

    /// The node's up axis (`+Y`) in local space.
    #[inline]
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.transform.rotation * Vec3::Y
    }

    /// The node's right axis (`+X`) in local space.
    #[inline]
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.transform.rotation * Vec3::X
    }

    /// Whether this node wants to be active.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this node is currently active (enabled, in a scene, and all
    /// ancestors active).
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether this node is transitively attached to the scene root.
    #[inline]
    #[must_use]
    pub fn is_in_scene(&self) -> bool {
        self.in_scene
    }

    /// The renderable instance slot.
    #[inline]
    #[must_use]
    pub fn renderable(&self) -> Option<RenderableInstance> {
        self.renderable
    }

    /// The light instance slot.
    #[inline]
    #[must_use]
    pub fn light(&self) -> Option<LightInstance> {
        self.light
    }

    /// Key of this node's collider in the scene's collision system, if a
    /// collision shape is set.
    #[inline]
    #[must_use]
    pub fn collider(&self) -> Option<ColliderKey> {
        self.collider
    }

    /// Registers a lifecycle listener. Listeners are notified in
    /// registration order.
    pub fn add_listener(&mut self, listener: Box<dyn NodeListener>) {
        self.listeners.push(listener);
    }

    /// Sets the tap handler, fired by the scene's gesture routing when a
    /// complete tap resolves to this node.
    pub fn set_on_tap(&mut self, handler: Option<TapHandler>) {
        self.on_tap = handler;
    }

    /// Sets the raw touch handler. Returning `true` consumes the event and
    /// stops it from bubbling to ancestors.
    pub fn set_on_touch(&mut self, handler: Option<TouchHandler>) {
        self.on_touch = handler;
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
