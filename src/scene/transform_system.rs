//! Transform System
//!
//! Hierarchy-aware dirty marking and lazy resolution for node transforms,
//! decoupled from [`crate::scene::Scene`] to avoid borrow conflicts. Every
//! function here borrows only the node arena.
//!
//! The contract:
//!
//! - Writing a local TRS field is O(1) on the node plus a downward walk that
//!   marks the `WORLD` dirty subset on descendants, short-circuiting any
//!   subtree whose world bits are already all set. The walk therefore only
//!   touches the not-yet-marked frontier.
//! - Reads resolve each dirty bit lazily and independently. Resolving a
//!   world matrix walks up the parent chain, reusing every clean ancestor
//!   cache on the way.

use glam::{Affine3A, Quat, Vec3};
use thunderdome::Arena;

use crate::collision::TransformProvider;
use crate::math;
use crate::scene::NodeHandle;
use crate::scene::node::Node;
use crate::scene::transform::DirtyFlags;

/// Marks a node's transform fully stale after a local TRS write and
/// propagates the world subset to its descendants.
pub fn mark_local_changed(nodes: &mut Arena<Node>, handle: NodeHandle) {
    let Some(node) = nodes.get_mut(handle) else {
        return;
    };
    node.transform.mark_all_dirty();
    let frontier = node.children.clone();
    propagate_world_dirty(nodes, frontier);
}

/// Marks a node's world-derived values stale (local TRS untouched) and
/// propagates to descendants. Used when the node is re-parented.
pub fn mark_world_changed(nodes: &mut Arena<Node>, handle: NodeHandle) {
    let Some(node) = nodes.get_mut(handle) else {
        return;
    };
    node.transform.mark_world_dirty();
    let frontier = node.children.clone();
    propagate_world_dirty(nodes, frontier);
}

fn propagate_world_dirty(nodes: &mut Arena<Node>, mut stack: Vec<NodeHandle>) {
    while let Some(handle) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };
        // Already fully marked: descendants were marked by the same change.
        if node.transform.mark_world_dirty() {
            stack.extend_from_slice(&node.children);
        }
    }
}

/// Resolves and returns a node's local matrix.
pub fn local_matrix(nodes: &mut Arena<Node>, handle: NodeHandle) -> Option<Affine3A> {
    nodes.get_mut(handle).map(|n| n.transform.resolve_local())
}

/// Resolves and returns a node's world matrix, resolving stale ancestors on
/// the way up. A node outside any scene resolves against an identity parent.
pub fn world_matrix(nodes: &mut Arena<Node>, handle: NodeHandle) -> Option<Affine3A> {
    let node = nodes.get(handle)?;
    if !node.transform.dirty.contains(DirtyFlags::WORLD_MATRIX) {
        return Some(node.transform.world_matrix);
    }

    let parent_world = match node.parent {
        Some(parent) => world_matrix(nodes, parent).unwrap_or(Affine3A::IDENTITY),
        None => Affine3A::IDENTITY,
    };

    let node = nodes.get_mut(handle)?;
    let world = parent_world * node.transform.resolve_local();
    node.transform.world_matrix = world;
    node.transform.dirty.remove(DirtyFlags::WORLD_MATRIX);
    Some(world)
}

/// Resolves and returns the inverse world matrix.
///
/// Returns `None` for a singular world matrix (e.g. zero scale); the bit is
/// left dirty so a later, non-degenerate read retries.
pub fn world_inverse_matrix(nodes: &mut Arena<Node>, handle: NodeHandle) -> Option<Affine3A> {
    let world = world_matrix(nodes, handle)?;
    let node = nodes.get_mut(handle)?;
    if node.transform.dirty.contains(DirtyFlags::WORLD_INVERSE) {
        let inverse = math::try_invert(&world)?;
        node.transform.world_inverse = inverse;
        node.transform.dirty.remove(DirtyFlags::WORLD_INVERSE);
    }
    Some(node.transform.world_inverse)
}

/// Resolves and returns the world position, decomposing from the world
/// matrix only when it was not set directly.
pub fn world_position(nodes: &mut Arena<Node>, handle: NodeHandle) -> Option<Vec3> {
    if !nodes
        .get(handle)?
        .transform
        .dirty
        .contains(DirtyFlags::WORLD_POSITION)
    {
        return Some(nodes.get(handle)?.transform.world_position);
    }
    let world = world_matrix(nodes, handle)?;
    let node = nodes.get_mut(handle)?;
    node.transform.put_world_position(math::decompose_translation(&world));
    Some(node.transform.world_position)
}

/// Resolves and returns the world rotation.
pub fn world_rotation(nodes: &mut Arena<Node>, handle: NodeHandle) -> Option<Quat> {
    if !nodes
        .get(handle)?
        .transform
        .dirty
        .contains(DirtyFlags::WORLD_ROTATION)
    {
        return Some(nodes.get(handle)?.transform.world_rotation);
    }
    let world = world_matrix(nodes, handle)?;
    let node = nodes.get_mut(handle)?;
    node.transform.put_world_rotation(math::decompose_rotation(&world));
    Some(node.transform.world_rotation)
}

/// Resolves and returns the world scale.
pub fn world_scale(nodes: &mut Arena<Node>, handle: NodeHandle) -> Option<Vec3> {
    if !nodes
        .get(handle)?
        .transform
        .dirty
        .contains(DirtyFlags::WORLD_SCALE)
    {
        return Some(nodes.get(handle)?.transform.world_scale);
    }
    let world = world_matrix(nodes, handle)?;
    let node = nodes.get_mut(handle)?;
    node.transform.put_world_scale(math::decompose_scale(&world));
    Some(node.transform.world_scale)
}

/// [`TransformProvider`] over the scene's node arena; the standard transform
/// source for collision queries.
pub struct NodeTransforms<'a> {
    nodes: &'a mut Arena<Node>,
}

impl<'a> NodeTransforms<'a> {
    /// Wraps a borrow of the node arena.
    pub fn new(nodes: &'a mut Arena<Node>) -> Self {
        Self { nodes }
    }
}

impl TransformProvider for NodeTransforms<'_> {
    fn world_matrix(&mut self, node: NodeHandle) -> Option<Affine3A> {
        world_matrix(self.nodes, node)
    }

    fn world_revision(&self, node: NodeHandle) -> u64 {
        self.nodes
            .get(node)
            .map_or(0, |n| n.transform.world_revision)
    }
}
