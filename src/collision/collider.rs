//! The binding between a collision shape and a transform source.

use glam::Affine3A;

use crate::collision::TransformProvider;
use crate::collision::shape::CollisionShape;
use crate::scene::NodeHandle;

/// Binds a local-space shape to the node providing its world transform and
/// caches the shape transformed into world space.
///
/// The cache is recomputed only when the local shape's change counter or the
/// owning transform's world revision differs from the last-seen values, so
/// transform changes cost O(1) to record and the world shape is resolved at
/// most once per change regardless of how many queries run against it.
#[derive(Debug)]
pub struct Collider {
    node: NodeHandle,
    shape: Option<CollisionShape>,
    cached_world_shape: Option<CollisionShape>,
    seen_shape_revision: u64,
    seen_world_revision: u64,
    pub(crate) attached: bool,
}

impl Collider {
    /// Creates a collider bound to `node`.
    #[must_use]
    pub fn new(node: NodeHandle, shape: CollisionShape) -> Self {
        Self {
            node,
            shape: Some(shape),
            cached_world_shape: None,
            seen_shape_revision: 0,
            seen_world_revision: 0,
            attached: false,
        }
    }

    /// The node whose world transform positions this collider.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    /// The local-space shape, if any.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Option<&CollisionShape> {
        self.shape.as_ref()
    }

    /// Mutable access to the local-space shape. Mutations bump the shape's
    /// change counter, which invalidates the cached world shape.
    #[inline]
    pub fn shape_mut(&mut self) -> Option<&mut CollisionShape> {
        self.shape.as_mut()
    }

    /// Replaces the local shape. A collider without a shape participates in
    /// no intersection tests.
    pub fn set_shape(&mut self, shape: Option<CollisionShape>) {
        self.shape = shape;
        self.cached_world_shape = None;
    }

    /// Whether this collider is currently registered for queries.
    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Returns the shape transformed into world space, recomputing the
    /// cached copy only if the local shape or the owning transform changed
    /// since the last call.
    pub fn transformed_shape<P: TransformProvider>(
        &mut self,
        transforms: &mut P,
    ) -> Option<&CollisionShape> {
        let shape_revision = self.shape.as_ref()?.revision();
        let world_revision = transforms.world_revision(self.node);

        let stale = self.cached_world_shape.is_none()
            || self.seen_shape_revision != shape_revision
            || self.seen_world_revision != world_revision;

        if stale {
            let world = transforms
                .world_matrix(self.node)
                .unwrap_or(Affine3A::IDENTITY);
            let shape = self.shape.as_ref()?;
            self.cached_world_shape = Some(shape.transformed(&world));
            self.seen_shape_revision = shape_revision;
            self.seen_world_revision = world_revision;
        }

        self.cached_world_shape.as_ref()
    }
}
