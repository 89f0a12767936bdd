//! Redb storage engine.

use std::fs;
use std::path::Path;

use redb::Database;

use crate::store::{KvError, KvResult, Store};

use super::transaction::RedbTx;

/// A durable single-file store backed by Redb.
///
/// Redb is a pure-Rust, page-structured, copy-on-write B-tree database.
/// Writers are serialized; readers run concurrently against a consistent
/// snapshot taken when their transaction begins.
///
/// # Example
///
/// ```ignore
/// let store = RedbStore::open("basin.redb")?;
/// store.update(|tx| {
///     tx.create_bucket_if_not_exists(b"usersv1")?;
///     tx.put(b"usersv1", b"key", b"value")
/// })?;
/// ```
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database file at `path`, creating missing parent
    /// directories first.
    ///
    /// The file lock is acquired without blocking: if another process holds
    /// the database this fails immediately with [`KvError::Open`] rather
    /// than hanging.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db =
            Database::builder().create(path).map_err(|e| KvError::Open(e.to_string()))?;
        tracing::info!(path = %path.display(), "opened key-value store");
        Ok(Self { db })
    }

    /// Create an in-memory database, lost when the store is dropped.
    pub fn in_memory() -> KvResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| KvError::Open(e.to_string()))?;
        Ok(Self { db })
    }
}

impl Store for RedbStore {
    type Tx<'a>
        = RedbTx
    where
        Self: 'a;

    fn begin_read(&self) -> KvResult<Self::Tx<'_>> {
        let tx = self.db.begin_read().map_err(|e| KvError::Transaction(e.to_string()))?;
        Ok(RedbTx::Read(tx))
    }

    fn begin_write(&self) -> KvResult<Self::Tx<'_>> {
        let tx = self.db.begin_write().map_err(|e| KvError::Transaction(e.to_string()))?;
        Ok(RedbTx::Write(tx))
    }
}
