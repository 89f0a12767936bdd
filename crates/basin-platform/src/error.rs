//! Domain error types.
//!
//! Store-level sentinels never cross the service boundary: services catch
//! them and translate into this taxonomy, so callers can branch on
//! "not found" and "already exists" as ordinary outcomes.

use basin_kv::KvError;
use thiserror::Error;

/// Errors surfaced by domain resource services.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The requested resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A resource with the same unique attribute already exists.
    #[error("{resource} with name {name} already exists")]
    AlreadyExists {
        /// The resource kind, e.g. `"user"`.
        resource: &'static str,
        /// The conflicting attribute value.
        name: String,
    },

    /// A malformed identifier encoding.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// An entity could not be serialized or deserialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A storage failure that is not an expected absence condition.
    #[error(transparent)]
    Store(#[from] KvError),
}

impl PlatformError {
    /// Whether this error reports a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error reports a unique-constraint violation.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Result type for domain service operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
