//! Durable storage engine backed by Redb.

mod buckets;
mod engine;
mod transaction;

pub use engine::RedbStore;
pub use transaction::{RedbCursor, RedbTx};
