//! Error types for local store implementations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is locked pending an external unlock.
    #[error("store is locked")]
    Locked,

    /// A transaction failed and its writes were discarded.
    #[error("transaction aborted: {reason}")]
    TransactionAborted {
        /// Reason for the abort.
        reason: String,
    },

    /// I/O error from a disk-backed implementation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Creates a transaction abort error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(StoreError::Locked.to_string(), "store is locked");
        assert_eq!(
            StoreError::aborted("record has no id").to_string(),
            "transaction aborted: record has no id"
        );
    }
}
