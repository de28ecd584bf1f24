//! Error types for the collider synchronizer

use crate::handle::{BodyId, ColliderId};
use crate::types::Bucket;
use thiserror::Error;

/// Result type for synchronizer operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while mirroring colliders into draw batches.
///
/// None of these abort the frame loop; each is contained to the collider that caused it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A bucket ran out of instances. The pool is sized too small for the scenario.
    #[error("{bucket} batch is full ({capacity} instances); raise its capacity")]
    CapacityExhausted { bucket: Bucket, capacity: usize },

    /// The collider's shape cannot be rendered.
    #[error("collider {collider} has an unrenderable shape: {shape}")]
    UnknownShape { collider: ColliderId, shape: String },

    /// Removal was requested for a collider the registry never tracked.
    #[error("collider {0} is not tracked")]
    UntrackedCollider(ColliderId),

    /// Removal was requested for a body with no tracked colliders.
    #[error("rigid body {0} has no tracked colliders")]
    UntrackedBody(BodyId),

    /// The physics view has no live collider with this handle.
    #[error("collider {0} does not exist in the physics world")]
    MissingCollider(ColliderId),
}

impl SyncError {
    /// Whether the error signals a configuration problem the operator must fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::CapacityExhausted { .. })
    }
}
