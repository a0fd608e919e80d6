//! Error Types
//!
//! This module defines the error types used throughout the core.
//!
//! # Overview
//!
//! Failures fall into two camps, and only the first is represented here:
//!
//! - Structural-constraint violations (attaching a node to one of its own
//!   descendants, referring to a node that is no longer in the graph) are
//!   surfaced as [`SceneError`] values. The scene graph is validated before
//!   any mutation, so a returned error guarantees the tree was left
//!   untouched.
//! - Programmer errors (violated single-thread invariants, double
//!   deactivation) panic loudly instead of being reported; see the scene
//!   module documentation.
//!
//! Degenerate geometry (singular matrices, zero-size shapes) is not an
//! error at all: inversion reports failure through `Option` and degenerate
//! shapes simply never intersect anything.

use thiserror::Error;

use crate::scene::NodeHandle;

/// The main error type for scene-graph mutations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// Attaching the child to this parent would form a cycle: the parent is
    /// the child itself or one of its descendants.
    #[error("cannot attach {child:?} to {parent:?}: parent is a descendant of child")]
    CycleDetected {
        /// The node being re-parented.
        child: NodeHandle,
        /// The requested parent.
        parent: NodeHandle,
    },

    /// The handle does not refer to a live node in this scene.
    #[error("node {0:?} not found in scene")]
    NodeNotFound(NodeHandle),
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;
