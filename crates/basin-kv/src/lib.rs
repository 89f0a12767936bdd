//! Transactional key-value storage for the basin platform.
//!
//! This crate defines the [`Store`] / [`Tx`] / [`Cursor`] contract that every
//! storage engine must honor, plus two engines behind it:
//!
//! - [`RedbStore`]: a durable single-file engine backed by Redb, with ACID
//!   transactions, serialized writers, and snapshot-isolated readers.
//! - [`MemStore`]: a process-local engine backed by ordered trees, used for
//!   tests and ephemeral deployments. Non-durable, but transactionally
//!   atomic: a failed update leaves no effect.
//!
//! Keys and values are opaque byte sequences grouped into named buckets.
//! Within a bucket, pairs are ordered by unsigned byte-wise key comparison,
//! and cursors iterate them identically on both engines.
//!
//! # Example
//!
//! ```no_run
//! use basin_kv::{KvError, RedbStore, Store, Tx};
//!
//! # fn main() -> Result<(), KvError> {
//! let store = RedbStore::open("basin.redb")?;
//!
//! store.update(|tx| {
//!     tx.create_bucket_if_not_exists(b"settings")?;
//!     tx.put(b"settings", b"theme", b"dark")
//! })?;
//!
//! let theme = store.view(|tx| tx.get(b"settings", b"theme"))?;
//! assert_eq!(theme, b"dark");
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]

pub mod backends;
pub mod cursor;
pub mod store;

pub use backends::{MemStore, RedbStore};
pub use cursor::{Pair, StaticCursor};
pub use store::{Cursor, KvError, KvResult, Store, Tx};
