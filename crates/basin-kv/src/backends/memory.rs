//! In-memory storage engine.
//!
//! A process-local engine backed by one ordered tree per bucket, guarded by
//! a single store-wide reader/writer lock. Non-durable; intended for tests
//! and ephemeral deployments.
//!
//! Write transactions stage copy-on-write clones of every touched bucket and
//! install them only on commit, so a failed update leaves the shared state
//! untouched and the engine honors the same all-or-nothing contract as the
//! durable engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cursor::{Pair, StaticCursor};
use crate::store::{KvError, KvResult, Store, Tx};

type Tree = BTreeMap<Vec<u8>, Vec<u8>>;
type BucketMap = HashMap<Vec<u8>, Tree>;

/// A non-durable in-memory store.
///
/// The lock is coarse: a write transaction excludes every other transaction
/// for its duration, and read transactions exclude writers.
#[derive(Debug, Default)]
pub struct MemStore {
    buckets: RwLock<BucketMap>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn bucket_missing(bucket: &[u8]) -> KvError {
    KvError::BucketNotFound(String::from_utf8_lossy(bucket).into_owned())
}

fn lock_poisoned() -> KvError {
    KvError::Internal("bucket map lock poisoned".to_string())
}

impl Store for MemStore {
    type Tx<'a>
        = MemTx<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> KvResult<Self::Tx<'_>> {
        let guard = self.buckets.read().map_err(|_| lock_poisoned())?;
        Ok(MemTx::Read(guard))
    }

    fn begin_write(&self) -> KvResult<Self::Tx<'_>> {
        let guard = self.buckets.write().map_err(|_| lock_poisoned())?;
        Ok(MemTx::Write { guard, staged: HashMap::new() })
    }
}

/// A transaction over a [`MemStore`].
pub enum MemTx<'a> {
    /// A read-only transaction holding the shared read lock.
    Read(RwLockReadGuard<'a, BucketMap>),
    /// A read-write transaction holding the exclusive write lock.
    ///
    /// `staged` holds clones of every bucket touched by a mutation; commit
    /// swaps them into the shared map wholesale, so deletions staged against
    /// a clone are carried over too.
    Write {
        guard: RwLockWriteGuard<'a, BucketMap>,
        staged: HashMap<Vec<u8>, Tree>,
    },
}

impl MemTx<'_> {
    fn tree(&self, bucket: &[u8]) -> KvResult<&Tree> {
        let tree = match self {
            Self::Read(guard) => guard.get(bucket),
            Self::Write { guard, staged } => staged.get(bucket).or_else(|| guard.get(bucket)),
        };
        tree.ok_or_else(|| bucket_missing(bucket))
    }

    fn tree_mut(&mut self, bucket: &[u8]) -> KvResult<&mut Tree> {
        match self {
            Self::Read(_) => Err(KvError::NotWritable),
            Self::Write { guard, staged } => {
                if !staged.contains_key(bucket) {
                    let tree = guard.get(bucket).cloned().ok_or_else(|| bucket_missing(bucket))?;
                    staged.insert(bucket.to_vec(), tree);
                }
                staged
                    .get_mut(bucket)
                    .ok_or_else(|| KvError::Internal("staged bucket vanished".to_string()))
            }
        }
    }
}

impl Tx for MemTx<'_> {
    type Cursor<'a>
        = StaticCursor
    where
        Self: 'a;

    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> KvResult<()> {
        match self {
            Self::Read(guard) => {
                if guard.contains_key(bucket) {
                    Ok(())
                } else {
                    Err(KvError::NotWritable)
                }
            }
            Self::Write { guard, staged } => {
                if !guard.contains_key(bucket) && !staged.contains_key(bucket) {
                    staged.insert(bucket.to_vec(), Tree::new());
                }
                Ok(())
            }
        }
    }

    fn get(&self, bucket: &[u8], key: &[u8]) -> KvResult<Vec<u8>> {
        self.tree(bucket)?.get(key).cloned().ok_or(KvError::KeyNotFound)
    }

    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> KvResult<()> {
        self.tree_mut(bucket)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> KvResult<bool> {
        Ok(self.tree_mut(bucket)?.remove(key).is_some())
    }

    fn cursor(&self, bucket: &[u8]) -> KvResult<Self::Cursor<'_>> {
        let pairs = self
            .tree(bucket)?
            .iter()
            .map(|(key, value)| Pair::new(key.clone(), value.clone()))
            .collect();
        Ok(StaticCursor::new(pairs))
    }

    fn is_writable(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    fn commit(self) -> KvResult<()> {
        match self {
            Self::Read(_) => Ok(()),
            Self::Write { mut guard, staged } => {
                for (bucket, tree) in staged {
                    guard.insert(bucket, tree);
                }
                Ok(())
            }
        }
    }

    fn rollback(self) -> KvResult<()> {
        // Dropping the staged clones discards every mutation.
        Ok(())
    }
}
