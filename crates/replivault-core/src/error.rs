//! Error types for the replivault-core crate

use thiserror::Error;

/// Result type alias using `CoordinatorError`
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Errors that can occur in coordination operations.
///
/// Every failure is local to the single call that produced it and leaves
/// all ledgers unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Caller lacks the required identity or role
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced key is absent from a ledger
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate registration
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Record is not in the required state, or an input value is out of range
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Node lacks free storage capacity for the requested file size
    #[error("insufficient capacity on node {node}: {free} free, {needed} needed")]
    InsufficientCapacity {
        node: String,
        free: u64,
        needed: u64,
    },

    /// Backup execution failed (reserved; not raised by any current operation)
    #[error("backup failed: {0}")]
    BackupFailed(String),
}
