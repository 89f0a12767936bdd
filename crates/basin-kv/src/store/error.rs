//! Storage error types.

use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// The key does not exist in the bucket.
    #[error("key not found")]
    KeyNotFound,

    /// The bucket has not been created.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// A mutating operation was attempted on a read-only transaction.
    #[error("transaction is not writable")]
    NotWritable,

    /// A cursor was advanced past either end of its pair sequence.
    #[error("cursor position out of range")]
    CursorOutOfRange,

    /// No key with the requested prefix exists at or after the seek point.
    #[error("prefix not found")]
    PrefixNotFound,

    /// The store could not be opened.
    #[error("failed to open store: {0}")]
    Open(String),

    /// The transaction could not be started or finalized.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// An internal engine failure.
    #[error("internal storage error: {0}")]
    Internal(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KvError {
    /// Whether this error is an absence condition rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound | Self::BucketNotFound(_))
    }
}

/// Result type for store operations.
pub type KvResult<T> = Result<T, KvError>;
