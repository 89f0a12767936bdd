//! Storage engine implementations.

pub mod memory;
pub mod redb;

pub use self::memory::MemStore;
pub use self::redb::RedbStore;
