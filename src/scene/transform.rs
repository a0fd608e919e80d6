//! The per-node transform component.
//!
//! Wraps local position/rotation/scale (TRS) together with cached local and
//! world matrices and the per-field dirty bookkeeping. This is pure data; the
//! hierarchy-aware marking and lazy resolution live in
//! [`crate::scene::transform_system`], which borrows only the node arena.

use bitflags::bitflags;
use glam::{Affine3A, EulerRot, Quat, Vec3};

bitflags! {
    /// Per-field staleness markers for cached derived transform values.
    ///
    /// Writing any local TRS field sets all six bits on the owning node and
    /// the `WORLD` subset on every descendant. Each bit is cleared
    /// independently when its value is resolved on read.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Cached local matrix is stale.
        const LOCAL_MATRIX = 1 << 0;
        /// Cached world matrix is stale.
        const WORLD_MATRIX = 1 << 1;
        /// Cached inverse world matrix is stale.
        const WORLD_INVERSE = 1 << 2;
        /// Cached world position is stale.
        const WORLD_POSITION = 1 << 3;
        /// Cached world rotation is stale.
        const WORLD_ROTATION = 1 << 4;
        /// Cached world scale is stale.
        const WORLD_SCALE = 1 << 5;

        /// The world-affecting subset; the only part that propagates to
        /// children.
        const WORLD = Self::WORLD_MATRIX.bits()
            | Self::WORLD_INVERSE.bits()
            | Self::WORLD_POSITION.bits()
            | Self::WORLD_ROTATION.bits()
            | Self::WORLD_SCALE.bits();

        /// Everything.
        const ALL = Self::LOCAL_MATRIX.bits() | Self::WORLD.bits();
    }
}

/// Local TRS plus cached derived values and their dirty mask.
#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,
    pub(crate) world_inverse: Affine3A,
    pub(crate) world_position: Vec3,
    pub(crate) world_rotation: Quat,
    pub(crate) world_scale: Vec3,

    pub(crate) dirty: DirtyFlags,
    pub(crate) world_revision: u64,
}

impl Transform {
    /// Identity transform with every cached value marked stale.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            world_inverse: Affine3A::IDENTITY,
            world_position: Vec3::ZERO,
            world_rotation: Quat::IDENTITY,
            world_scale: Vec3::ONE,

            dirty: DirtyFlags::ALL,
            world_revision: 0,
        }
    }

    /// Local position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation.
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Current dirty mask.
    #[inline]
    #[must_use]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Counter bumped whenever the world-affecting bits go from clean to
    /// fully set. Colliders compare this to detect transform changes.
    #[inline]
    #[must_use]
    pub fn world_revision(&self) -> u64 {
        self.world_revision
    }

    /// Builds a local rotation from XYZ euler angles (radians).
    pub(crate) fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Marks every cached value stale. Used when a local field changes.
    pub(crate) fn mark_all_dirty(&mut self) {
        self.dirty |= DirtyFlags::LOCAL_MATRIX;
        self.mark_world_dirty();
    }

    /// Marks the world-affecting subset stale, bumping the revision.
    ///
    /// Returns `false` without bumping when all world bits were already
    /// set — the signal that lets hierarchy propagation short-circuit an
    /// already-marked subtree.
    pub(crate) fn mark_world_dirty(&mut self) -> bool {
        if self.dirty.contains(DirtyFlags::WORLD) {
            return false;
        }
        self.dirty |= DirtyFlags::WORLD;
        self.world_revision += 1;
        true
    }

    /// Resolves and returns the local matrix.
    pub(crate) fn resolve_local(&mut self) -> Affine3A {
        if self.dirty.contains(DirtyFlags::LOCAL_MATRIX) {
            self.local_matrix =
                Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
            self.dirty.remove(DirtyFlags::LOCAL_MATRIX);
        }
        self.local_matrix
    }

    /// Caches an exactly-known world position and clears only its bit,
    /// skipping the matrix decomposition on the next read.
    pub(crate) fn put_world_position(&mut self, position: Vec3) {
        self.world_position = position;
        self.dirty.remove(DirtyFlags::WORLD_POSITION);
    }

    /// Caches an exactly-known world rotation and clears only its bit.
    pub(crate) fn put_world_rotation(&mut self, rotation: Quat) {
        self.world_rotation = rotation;
        self.dirty.remove(DirtyFlags::WORLD_ROTATION);
    }

    /// Caches an exactly-known world scale and clears only its bit.
    pub(crate) fn put_world_scale(&mut self, scale: Vec3) {
        self.world_scale = scale;
        self.dirty.remove(DirtyFlags::WORLD_SCALE);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
