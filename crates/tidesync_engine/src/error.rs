//! Error types for the sync engine.

use thiserror::Error;
use tidesync_store::StoreError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while dispatching and running syncs.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A second handler was registered under an already-claimed type key.
    /// This is a startup programmer error, not a recoverable condition.
    #[error("sync handler already registered: {handler}")]
    HandlerAlreadyRegistered {
        /// The contested type key.
        handler: String,
    },

    /// A request referenced a type key no handler was registered under.
    #[error("sync handler not registered: {handler}")]
    HandlerNotRegistered {
        /// The unknown type key.
        handler: String,
    },

    /// Store error during reconciliation or staleness bookkeeping.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
