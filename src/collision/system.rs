//! The registry of live colliders and its linear-scan queries.

use slotmap::{SlotMap, new_key_type};

use crate::collision::TransformProvider;
use crate::collision::collider::Collider;
use crate::collision::ray::{Ray, RayHit};

new_key_type! {
    /// Stable key for a collider registered with a [`CollisionSystem`].
    pub struct ColliderKey;
}

/// Owns the set of colliders that can take part in intersection queries.
///
/// Colliders are registered once and toggled attached/detached as their
/// owning nodes activate and deactivate; queries scan only attached ones.
/// The set is never mutated during a query, so a raycast can never trigger
/// activation side effects.
#[derive(Debug, Default)]
pub struct CollisionSystem {
    colliders: SlotMap<ColliderKey, Collider>,
}

impl CollisionSystem {
    /// Creates an empty system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collider, initially detached.
    pub fn add_collider(&mut self, collider: Collider) -> ColliderKey {
        self.colliders.insert(collider)
    }

    /// Removes a collider entirely.
    pub fn remove_collider(&mut self, key: ColliderKey) -> Option<Collider> {
        self.colliders.remove(key)
    }

    /// Read access to a collider.
    #[must_use]
    pub fn collider(&self, key: ColliderKey) -> Option<&Collider> {
        self.colliders.get(key)
    }

    /// Mutable access to a collider (e.g. to mutate its shape).
    pub fn collider_mut(&mut self, key: ColliderKey) -> Option<&mut Collider> {
        self.colliders.get_mut(key)
    }

    /// Marks a collider as participating in queries or not. Called as a
    /// side effect of node activation and deactivation only.
    pub fn set_attached(&mut self, key: ColliderKey, attached: bool) {
        if let Some(collider) = self.colliders.get_mut(key) {
            collider.attached = attached;
        }
    }

    /// Number of colliders currently attached.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.colliders.values().filter(|c| c.attached).count()
    }

    /// Casts a ray against every attached collider and returns the closest
    /// hit. Colliders without a shape are skipped.
    pub fn raycast<P: TransformProvider>(
        &mut self,
        ray: &Ray,
        transforms: &mut P,
    ) -> Option<(ColliderKey, RayHit)> {
        let mut best: Option<(ColliderKey, RayHit)> = None;
        for (key, collider) in &mut self.colliders {
            if !collider.attached {
                continue;
            }
            let Some(shape) = collider.transformed_shape(transforms) else {
                continue;
            };
            if let Some(hit) = shape.raycast(ray)
                && best.as_ref().is_none_or(|(_, b)| hit.distance < b.distance)
            {
                best = Some((key, hit));
            }
        }
        best
    }

    /// Casts a ray against every attached collider, collecting every hit
    /// into `results` in scan order (callers sort by distance if needed).
    pub fn raycast_all<P: TransformProvider>(
        &mut self,
        ray: &Ray,
        transforms: &mut P,
        results: &mut Vec<(ColliderKey, RayHit)>,
    ) {
        results.clear();
        for (key, collider) in &mut self.colliders {
            if !collider.attached {
                continue;
            }
            let Some(shape) = collider.transformed_shape(transforms) else {
                continue;
            };
            if let Some(hit) = shape.raycast(ray) {
                results.push((key, hit));
            }
        }
    }

    /// Tests one collider against the rest of the attached set, returning
    /// the first overlap found.
    pub fn intersects<P: TransformProvider>(
        &mut self,
        key: ColliderKey,
        transforms: &mut P,
    ) -> Option<ColliderKey> {
        let subject = self
            .colliders
            .get_mut(key)?
            .transformed_shape(transforms)?
            .clone();

        for (other_key, other) in &mut self.colliders {
            if other_key == key || !other.attached {
                continue;
            }
            let Some(shape) = other.transformed_shape(transforms) else {
                continue;
            };
            if subject.intersects(shape) {
                return Some(other_key);
            }
        }
        None
    }

    /// Tests one collider against the rest of the attached set, collecting
    /// every overlapping collider into `results`.
    pub fn intersects_all<P: TransformProvider>(
        &mut self,
        key: ColliderKey,
        transforms: &mut P,
        results: &mut Vec<ColliderKey>,
    ) {
        results.clear();
        let Some(collider) = self.colliders.get_mut(key) else {
            return;
        };
        let Some(subject) = collider.transformed_shape(transforms) else {
            return;
        };
        let subject = subject.clone();

        for (other_key, other) in &mut self.colliders {
            if other_key == key || !other.attached {
                continue;
            }
            let Some(shape) = other.transformed_shape(transforms) else {
                continue;
            };
            if subject.intersects(shape) {
                results.push(other_key);
            }
        }
    }
}
