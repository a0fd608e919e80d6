//! The scene: root of the node graph, owner of the collision system, and
//! dispatcher for per-frame updates and touch events.
//!
//! # Threading
//!
//! All mutation, traversal, and queries are expected on one designated
//! thread; the scene contains no locking. Background producers hand
//! finished objects (e.g. loaded renderable instances) to the designated
//! thread before touching the graph.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Mat4, Quat, Vec3};
use thunderdome::Arena;

use crate::collision::{Collider, CollisionShape, CollisionSystem, Ray};
use crate::errors::{Result, SceneError};
use crate::math;
use crate::render::{LightInstance, NullBinding, RenderBinding, RenderableInstance};
use crate::scene::gesture::{TouchEvent, TouchEventSystem};
use crate::scene::node::{Node, NodeListener};
use crate::scene::transform_system::{self, NodeTransforms};
use crate::scene::{FrameTime, NodeHandle};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// A node resolved from a hit-test query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// The node owning the hit collider.
    pub node: NodeHandle,
    /// World-space hit location.
    pub point: Vec3,
    /// Distance along the ray.
    pub distance: f32,
}

/// The scene graph root.
///
/// Owns the node arena, the collision system shared by all descendant
/// colliders, the renderer binding, and the gesture state. Top-level nodes
/// are attached directly to the scene ("root slots"); the scene itself
/// always counts as active.
pub struct Scene {
    /// Process-unique scene id.
    pub id: u32,

    pub(crate) nodes: Arena<Node>,
    /// Top-level node handles in insertion order.
    pub root_nodes: Vec<NodeHandle>,

    collision: CollisionSystem,
    renderer: Box<dyn RenderBinding>,
    touch: TouchEventSystem,
    update_listeners: Vec<Box<dyn FnMut(&FrameTime)>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a headless scene (renderer calls are discarded).
    #[must_use]
    pub fn new() -> Self {
        Self::with_binding(Box::new(NullBinding))
    }

    /// Creates a scene driving the given renderer binding.
    #[must_use]
    pub fn with_binding(renderer: Box<dyn RenderBinding>) -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Arena::new(),
            root_nodes: Vec::new(),
            collision: CollisionSystem::new(),
            renderer,
            touch: TouchEventSystem::new(),
            update_listeners: Vec::new(),
        }
    }

    // ========================================================================
    // Node creation & removal
    // ========================================================================

    /// Inserts a new detached node and returns its handle.
    pub fn create_node(&mut self) -> NodeHandle {
        self.nodes.insert(Node::new())
    }

    /// Inserts a new detached node with a name.
    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.nodes.insert(Node::with_name(name))
    }

    /// Inserts a node and attaches it as a top-level node.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        self.refresh_active(handle, true, true);
        handle
    }

    /// Removes a node and its entire subtree, deactivating it first.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains(handle) {
            return;
        }
        // Deactivation side effects (renderer/collision detach, listeners)
        // run before any node is dropped.
        let _ = self.detach(handle);

        let mut subtree = vec![handle];
        let mut index = 0;
        while index < subtree.len() {
            if let Some(node) = self.nodes.get(subtree[index]) {
                subtree.extend_from_slice(&node.children);
            }
            index += 1;
        }
        for h in subtree {
            if let Some(node) = self.nodes.remove(h)
                && let Some(key) = node.collider
            {
                self.collision.remove_collider(key);
            }
        }
    }

    /// Read access to a node.
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    /// Mutable access to a node (names, listeners, gesture handlers).
    /// Transform writes go through the scene's setters instead.
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Number of live nodes, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Attaches `child` below `parent`, detaching it from its previous
    /// parent first.
    ///
    /// Fails without mutating the tree when either handle is dead or when
    /// `parent` is `child` itself or one of its descendants.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> Result<()> {
        if !self.nodes.contains(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if !self.nodes.contains(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        if child == parent || self.has_ancestor(parent, child) {
            log::warn!("refusing to attach {child:?}: {parent:?} is itself or a descendant");
            return Err(SceneError::CycleDetected { child, parent });
        }

        self.detach_internal(child);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
        transform_system::mark_world_changed(&mut self.nodes, child);

        let (parent_active, parent_in_scene) = self
            .nodes
            .get(parent)
            .map_or((false, false), |p| (p.active, p.in_scene));
        self.refresh_active(child, parent_active, parent_in_scene);
        Ok(())
    }

    /// Attaches a node directly under the scene as a top-level node.
    pub fn attach_to_root(&mut self, handle: NodeHandle) -> Result<()> {
        if !self.nodes.contains(handle) {
            return Err(SceneError::NodeNotFound(handle));
        }
        if self.root_nodes.contains(&handle) {
            return Ok(());
        }
        self.detach_internal(handle);
        self.root_nodes.push(handle);
        transform_system::mark_world_changed(&mut self.nodes, handle);
        self.refresh_active(handle, true, true);
        Ok(())
    }

    /// Detaches a node from its parent (or from the root slots), leaving it
    /// and its subtree in the arena but outside the scene. The subtree
    /// deactivates immediately.
    pub fn detach(&mut self, handle: NodeHandle) -> Result<()> {
        if !self.nodes.contains(handle) {
            return Err(SceneError::NodeNotFound(handle));
        }
        self.detach_internal(handle);
        transform_system::mark_world_changed(&mut self.nodes, handle);
        self.refresh_active(handle, false, false);
        Ok(())
    }

    fn detach_internal(&mut self, child: NodeHandle) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent_node) = self.nodes.get_mut(p) {
                parent_node.children.retain(|&c| c != child);
            }
        } else {
            self.root_nodes.retain(|&r| r != child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
    }

    /// Whether `ancestor` appears on `handle`'s parent chain.
    fn has_ancestor(&self, handle: NodeHandle, ancestor: NodeHandle) -> bool {
        let mut current = self.nodes.get(handle).and_then(|n| n.parent);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.nodes.get(h).and_then(|n| n.parent);
        }
        false
    }

    /// Handles from `start` up to its root, inclusive.
    pub(crate) fn ancestor_chain(&self, start: Option<NodeHandle>) -> Vec<NodeHandle> {
        let mut chain = Vec::new();
        let mut current = start;
        while let Some(h) = current {
            let Some(node) = self.nodes.get(h) else {
                break;
            };
            chain.push(h);
            current = node.parent;
        }
        chain
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Renames a node. Names are not unique.
    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.name = name.to_owned();
        }
    }

    /// A node's name, if the handle is live.
    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle).map(Node::name)
    }

    /// Breadth-first search for the first attached node with this name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        let mut queue: std::collections::VecDeque<NodeHandle> =
            self.root_nodes.iter().copied().collect();
        while let Some(handle) = queue.pop_front() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if node.name == name {
                return Some(handle);
            }
            queue.extend(node.children.iter().copied());
        }
        None
    }

    // ========================================================================
    // Enabled / active
    // ========================================================================

    /// Enables or disables a node; active status is recomputed for the
    /// whole subtree and activation side effects fire immediately.
    pub fn set_enabled(&mut self, handle: NodeHandle, enabled: bool) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        if node.enabled == enabled {
            return;
        }
        node.enabled = enabled;
        let (parent_active, in_scene) = self.parent_env(handle);
        self.refresh_active(handle, parent_active, in_scene);
    }

    fn parent_env(&self, handle: NodeHandle) -> (bool, bool) {
        match self.nodes.get(handle).and_then(|n| n.parent) {
            Some(p) => self
                .nodes
                .get(p)
                .map_or((false, false), |pn| (pn.active, pn.in_scene)),
            None => {
                let is_root = self.root_nodes.contains(&handle);
                (is_root, is_root)
            }
        }
    }

    /// Recomputes active status top-down so descendants always re-evaluate
    /// after their ancestors.
    fn refresh_active(&mut self, handle: NodeHandle, parent_active: bool, in_scene: bool) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        node.in_scene = in_scene;
        let desired = node.enabled && in_scene && parent_active;
        let changed = desired != node.active;
        node.active = desired;
        let children = node.children.clone();

        if changed {
            if desired {
                self.on_node_activated(handle);
            } else {
                self.on_node_deactivated(handle);
            }
        }
        for child in children {
            self.refresh_active(child, desired, in_scene);
        }
    }

    fn on_node_activated(&mut self, handle: NodeHandle) {
        let (renderable, light, collider) = {
            let Some(node) = self.nodes.get(handle) else {
                return;
            };
            (node.renderable, node.light, node.collider)
        };
        if let Some(instance) = renderable {
            self.renderer.attach_instance(instance);
        }
        if let Some(light) = light {
            self.renderer.attach_light(light);
        }
        if let Some(key) = collider {
            self.collision.set_attached(key, true);
        }
        self.for_each_listener(handle, |listener, scene, h| listener.on_activated(scene, h));
    }

    fn on_node_deactivated(&mut self, handle: NodeHandle) {
        let (renderable, light, collider) = {
            let Some(node) = self.nodes.get(handle) else {
                return;
            };
            (node.renderable, node.light, node.collider)
        };
        if let Some(instance) = renderable {
            self.renderer.detach_instance(instance);
        }
        if let Some(light) = light {
            self.renderer.detach_light(light);
        }
        if let Some(key) = collider {
            self.collision.set_attached(key, false);
        }
        self.for_each_listener(handle, |listener, scene, h| listener.on_deactivated(scene, h));
    }

    /// Runs `f` over a node's listeners with the scene borrowed mutably.
    ///
    /// The listener list is taken out of the node for the duration, so a
    /// listener mutating this node will not observe (or invalidate) the
    /// list being iterated; listeners registered during dispatch are kept.
    fn for_each_listener<F>(&mut self, handle: NodeHandle, mut f: F)
    where
        F: FnMut(&mut dyn NodeListener, &mut Scene, NodeHandle),
    {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        let mut listeners = std::mem::take(&mut node.listeners);
        for listener in &mut listeners {
            f(listener.as_mut(), self, handle);
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            let added = std::mem::take(&mut node.listeners);
            listeners.extend(added);
            node.listeners = listeners;
        }
    }

    /// Registers a lifecycle listener on a node.
    pub fn add_node_listener(&mut self, handle: NodeHandle, listener: Box<dyn NodeListener>) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.add_listener(listener);
        }
    }

    // ========================================================================
    // Capabilities: renderable, light, collision shape
    // ========================================================================

    /// Sets or clears a node's renderable instance. If the node is active
    /// the instance is attached to (or detached from) the renderer
    /// immediately.
    pub fn set_renderable(&mut self, handle: NodeHandle, renderable: Option<RenderableInstance>) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        let active = node.active;
        let old = node.renderable;
        node.renderable = renderable;
        if active {
            if let Some(instance) = old {
                self.renderer.detach_instance(instance);
            }
            if let Some(instance) = renderable {
                self.renderer.attach_instance(instance);
            }
        }
    }

    /// Sets or clears a node's light instance, with the same activation
    /// semantics as [`Scene::set_renderable`].
    pub fn set_light(&mut self, handle: NodeHandle, light: Option<LightInstance>) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        let active = node.active;
        let old = node.light;
        node.light = light;
        if active {
            if let Some(instance) = old {
                self.renderer.detach_light(instance);
            }
            if let Some(instance) = light {
                self.renderer.attach_light(instance);
            }
        }
    }

    /// Sets or clears a node's collision shape.
    ///
    /// The first shape creates a collider bound to this node in the scene's
    /// collision system; clearing removes it. The collider participates in
    /// queries only while the node is active.
    pub fn set_collision_shape(&mut self, handle: NodeHandle, shape: Option<CollisionShape>) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let active = node.active;
        match (node.collider, shape) {
            (Some(key), Some(shape)) => {
                if let Some(collider) = self.collision.collider_mut(key) {
                    collider.set_shape(Some(shape));
                }
            }
            (Some(key), None) => {
                self.collision.remove_collider(key);
                if let Some(node) = self.nodes.get_mut(handle) {
                    node.collider = None;
                }
            }
            (None, Some(shape)) => {
                let key = self.collision.add_collider(Collider::new(handle, shape));
                self.collision.set_attached(key, active);
                if let Some(node) = self.nodes.get_mut(handle) {
                    node.collider = Some(key);
                }
            }
            (None, None) => {}
        }
    }

    /// Read access to a node's local-space collision shape.
    #[must_use]
    pub fn collision_shape(&self, handle: NodeHandle) -> Option<&CollisionShape> {
        let key = self.nodes.get(handle)?.collider?;
        self.collision.collider(key)?.shape()
    }

    /// Mutable access to a node's collision shape; mutations bump its
    /// change counter and invalidate the cached world-space copy.
    pub fn collision_shape_mut(&mut self, handle: NodeHandle) -> Option<&mut CollisionShape> {
        let key = self.nodes.get(handle)?.collider?;
        self.collision.collider_mut(key)?.shape_mut()
    }

    /// The scene's collision system.
    #[must_use]
    pub fn collision_system(&self) -> &CollisionSystem {
        &self.collision
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Sets the local position, marking this node and its descendants'
    /// world-derived caches stale.
    pub fn set_local_position(&mut self, handle: NodeHandle, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.position = position;
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
    }

    /// Sets the local rotation.
    pub fn set_local_rotation(&mut self, handle: NodeHandle, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.rotation = rotation.normalize();
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
    }

    /// Sets the local rotation from XYZ euler angles in radians.
    pub fn set_local_rotation_euler(&mut self, handle: NodeHandle, x: f32, y: f32, z: f32) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.set_rotation_euler(x, y, z);
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
    }

    /// Sets the local scale.
    pub fn set_local_scale(&mut self, handle: NodeHandle, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.scale = scale;
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
    }

    /// Sets the world-space position by converting through the parent's
    /// inverse world matrix. The given value is cached exactly, so reading
    /// it back performs no decomposition.
    pub fn set_world_position(&mut self, handle: NodeHandle, position: Vec3) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let local = match node.parent {
            Some(p) => {
                let Some(inverse) = transform_system::world_inverse_matrix(&mut self.nodes, p)
                else {
                    log::warn!("set_world_position: parent {p:?} world matrix is singular");
                    return;
                };
                inverse.transform_point3(position)
            }
            None => position,
        };
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.position = local;
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.put_world_position(position);
        }
    }

    /// Sets the world-space rotation; the exact value is cached like
    /// [`Scene::set_world_position`].
    pub fn set_world_rotation(&mut self, handle: NodeHandle, rotation: Quat) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let rotation = rotation.normalize();
        let local = match node.parent {
            Some(p) => {
                let Some(parent_rotation) = transform_system::world_rotation(&mut self.nodes, p)
                else {
                    return;
                };
                (parent_rotation.inverse() * rotation).normalize()
            }
            None => rotation,
        };
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.rotation = local;
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.put_world_rotation(rotation);
        }
    }

    /// Sets the world-space scale; parent scale components near zero are
    /// left undivided.
    pub fn set_world_scale(&mut self, handle: NodeHandle, scale: Vec3) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let local = match node.parent {
            Some(p) => {
                let Some(parent_scale) = transform_system::world_scale(&mut self.nodes, p) else {
                    return;
                };
                Vec3::new(
                    safe_div(scale.x, parent_scale.x),
                    safe_div(scale.y, parent_scale.y),
                    safe_div(scale.z, parent_scale.z),
                )
            }
            None => scale,
        };
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.scale = local;
            transform_system::mark_local_changed(&mut self.nodes, handle);
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.put_world_scale(scale);
        }
    }

    /// Resolves the node's local matrix.
    pub fn local_matrix(&mut self, handle: NodeHandle) -> Option<Affine3A> {
        transform_system::local_matrix(&mut self.nodes, handle)
    }

    /// Resolves the node's world model matrix. Detached nodes resolve
    /// against an identity parent.
    pub fn world_matrix(&mut self, handle: NodeHandle) -> Option<Affine3A> {
        transform_system::world_matrix(&mut self.nodes, handle)
    }

    /// The world matrix as a `Mat4` for upload boundaries.
    pub fn world_matrix_as_mat4(&mut self, handle: NodeHandle) -> Option<Mat4> {
        self.world_matrix(handle).map(Mat4::from)
    }

    /// Resolves the inverse world matrix; `None` when singular.
    pub fn world_inverse_matrix(&mut self, handle: NodeHandle) -> Option<Affine3A> {
        transform_system::world_inverse_matrix(&mut self.nodes, handle)
    }

    /// Resolves the world position.
    pub fn world_position(&mut self, handle: NodeHandle) -> Option<Vec3> {
        transform_system::world_position(&mut self.nodes, handle)
    }

    /// Resolves the world rotation.
    pub fn world_rotation(&mut self, handle: NodeHandle) -> Option<Quat> {
        transform_system::world_rotation(&mut self.nodes, handle)
    }

    /// Resolves the world scale.
    pub fn world_scale(&mut self, handle: NodeHandle) -> Option<Vec3> {
        transform_system::world_scale(&mut self.nodes, handle)
    }

    /// Transforms a local-space point into world space.
    pub fn local_to_world_point(&mut self, handle: NodeHandle, point: Vec3) -> Option<Vec3> {
        Some(self.world_matrix(handle)?.transform_point3(point))
    }

    /// Transforms a world-space point into this node's local space;
    /// `None` when the world matrix is singular.
    pub fn world_to_local_point(&mut self, handle: NodeHandle, point: Vec3) -> Option<Vec3> {
        Some(self.world_inverse_matrix(handle)?.transform_point3(point))
    }

    /// Transforms a local-space direction into world space.
    pub fn local_to_world_direction(&mut self, handle: NodeHandle, dir: Vec3) -> Option<Vec3> {
        Some(self.world_matrix(handle)?.transform_vector3(dir))
    }

    /// Transforms a world-space direction into this node's local space.
    pub fn world_to_local_direction(&mut self, handle: NodeHandle, dir: Vec3) -> Option<Vec3> {
        Some(self.world_inverse_matrix(handle)?.transform_vector3(dir))
    }

    /// The node's forward axis (`-Z`) in world space.
    pub fn world_forward(&mut self, handle: NodeHandle) -> Option<Vec3> {
        Some(self.world_rotation(handle)? * Vec3::NEG_Z)
    }

    /// The node's up axis (`+Y`) in world space.
    pub fn world_up(&mut self, handle: NodeHandle) -> Option<Vec3> {
        Some(self.world_rotation(handle)? * Vec3::Y)
    }

    /// The node's right axis (`+X`) in world space.
    pub fn world_right(&mut self, handle: NodeHandle) -> Option<Vec3> {
        Some(self.world_rotation(handle)? * Vec3::X)
    }

    /// Orients the node so its forward axis points at a world-space
    /// target. No-op for degenerate forward/up pairs.
    pub fn look_at(&mut self, handle: NodeHandle, target: Vec3, up: Vec3) {
        let Some(position) = self.world_position(handle) else {
            return;
        };
        let Some(rotation) = math::look_rotation(target - position, up) else {
            return;
        };
        self.set_world_rotation(handle, rotation);
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Registers a scene-level update listener, invoked in registration
    /// order at the start of every [`Scene::dispatch_update`].
    pub fn add_update_listener(&mut self, listener: Box<dyn FnMut(&FrameTime)>) {
        self.update_listeners.push(listener);
    }

    /// Drives one frame: scene-level listeners first, then a depth-first
    /// walk invoking every active node's update hook. Inactive nodes and
    /// their entire subtrees are skipped, so the cost is proportional to
    /// the active node count.
    pub fn dispatch_update(&mut self, frame: &FrameTime) {
        let mut listeners = std::mem::take(&mut self.update_listeners);
        for listener in &mut listeners {
            listener(frame);
        }
        let added = std::mem::take(&mut self.update_listeners);
        listeners.extend(added);
        self.update_listeners = listeners;

        let mut stack: Vec<NodeHandle> = self.root_nodes.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if !node.active {
                continue;
            }
            let children = node.children.clone();
            self.for_each_listener(handle, |listener, scene, h| {
                listener.on_updated(scene, h, frame);
            });
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
    }

    // ========================================================================
    // Hit testing & overlap
    // ========================================================================

    /// Casts a ray against every active collider and returns the closest
    /// hit, mapped back to the owning node.
    pub fn hit_test(&mut self, ray: &Ray) -> Option<HitResult> {
        let mut transforms = NodeTransforms::new(&mut self.nodes);
        let (key, hit) = self.collision.raycast(ray, &mut transforms)?;
        let node = self.collision.collider(key)?.node();
        Some(HitResult {
            node,
            point: hit.point,
            distance: hit.distance,
        })
    }

    /// Casts a ray against every active collider and returns all hits
    /// ordered by distance.
    pub fn hit_test_all(&mut self, ray: &Ray) -> Vec<HitResult> {
        let mut hits = Vec::new();
        {
            let mut transforms = NodeTransforms::new(&mut self.nodes);
            self.collision.raycast_all(ray, &mut transforms, &mut hits);
        }
        let mut results: Vec<HitResult> = hits
            .into_iter()
            .filter_map(|(key, hit)| {
                Some(HitResult {
                    node: self.collision.collider(key)?.node(),
                    point: hit.point,
                    distance: hit.distance,
                })
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    /// Tests a node's collider against the rest of the active set,
    /// returning the first overlapping node.
    pub fn overlap(&mut self, handle: NodeHandle) -> Option<NodeHandle> {
        let key = self.nodes.get(handle)?.collider?;
        let mut transforms = NodeTransforms::new(&mut self.nodes);
        let other = self.collision.intersects(key, &mut transforms)?;
        Some(self.collision.collider(other)?.node())
    }

    /// Tests a node's collider against the rest of the active set,
    /// returning every overlapping node.
    pub fn overlap_all(&mut self, handle: NodeHandle) -> Vec<NodeHandle> {
        let Some(key) = self.nodes.get(handle).and_then(|n| n.collider) else {
            return Vec::new();
        };
        let mut keys = Vec::new();
        {
            let mut transforms = NodeTransforms::new(&mut self.nodes);
            self.collision.intersects_all(key, &mut transforms, &mut keys);
        }
        keys.into_iter()
            .filter_map(|k| Some(self.collision.collider(k)?.node()))
            .collect()
    }

    // ========================================================================
    // Touch dispatch
    // ========================================================================

    /// Routes a touch event: resolves the pick ray to a node, bubbles raw
    /// touch handlers from it toward the root, and advances tap tracking.
    pub fn dispatch_touch(&mut self, event: &TouchEvent, ray: &Ray) -> bool {
        let hit = self.hit_test(ray).map(|r| r.node);
        let mut touch = std::mem::take(&mut self.touch);
        let handled = touch.dispatch(self, event, hit);
        self.touch = touch;
        handled
    }

    /// The gesture state (tracking status, slop).
    #[must_use]
    pub fn touch_system(&self) -> &TouchEventSystem {
        &self.touch
    }

    /// Overrides the tap slop with a device-specific value.
    pub fn set_touch_slop(&mut self, slop: f32) {
        self.touch.set_touch_slop(slop);
    }
}

fn safe_div(numerator: f32, denominator: f32) -> f32 {
    if denominator.abs() < math::EPSILON {
        numerator
    } else {
        numerator / denominator
    }
}
