//! Error types for the delivery window

use thiserror::Error;

/// Result type for delivery window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Errors raised while building or using a [`crate::DeliveryWindow`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// Capacity must be at least one entry
    #[error("Invalid window capacity: {0}")]
    InvalidCapacity(usize),

    /// Capacity must strictly exceed the largest replay burst it has to absorb
    #[error("Window capacity {capacity} does not exceed max replay burst {max_replay_burst}")]
    BurstExceedsCapacity {
        capacity: usize,
        max_replay_burst: usize,
    },

    /// Dedupe key validation failed (empty or too long)
    #[error("Invalid dedupe key: {0}")]
    InvalidKey(String),
}
