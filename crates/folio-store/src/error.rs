//! Store error types.

use folio_types::DocumentId;
use thiserror::Error;

/// Errors from a [`crate::DocumentStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with this id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// SQLite backend failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A block payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store is unreachable or rejected the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
