//! Resource identifiers and identifier generation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};

/// A unique resource identifier.
///
/// Encoded as a fixed-width big-endian byte sequence before use as a store
/// key, so byte-wise key comparison preserves numeric order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Id(u64);

/// Width of the encoded identifier in bytes.
pub const ID_LENGTH: usize = 8;

impl Id {
    /// Create an identifier from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Encode to the fixed-width key representation.
    #[inline]
    #[must_use]
    pub const fn encode(self) -> [u8; ID_LENGTH] {
        self.0.to_be_bytes()
    }

    /// Decode from the fixed-width key representation.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidId`] for any other length; a
    /// malformed encoding is fatal for the operation, not retriable.
    pub fn decode(bytes: &[u8]) -> PlatformResult<Self> {
        let raw: [u8; ID_LENGTH] = bytes.try_into().map_err(|_| {
            PlatformError::InvalidId(format!("expected {ID_LENGTH} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(u64::from_be_bytes(raw)))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for Id {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// A source of unique identifiers, injected into resource services.
///
/// Concurrent calls must never yield the same identifier.
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier.
    fn next_id(&self) -> Id;
}

/// A monotonically increasing in-process identifier generator.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Create a generator starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_start(1)
    }

    /// Create a generator resuming from `start`, e.g. after reloading
    /// previously stored entities.
    #[must_use]
    pub const fn with_start(start: u64) -> Self {
        Self { next: AtomicU64::new(start) }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Id {
        Id::new(self.next.fetch_add(1, Ordering::SeqCst))
    }
}
