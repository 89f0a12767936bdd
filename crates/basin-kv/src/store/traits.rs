//! Core store traits.

use std::sync::Arc;

use crate::cursor::Pair;

use super::{KvError, KvResult};

/// A transactional key-value store.
///
/// Engines implement [`begin_read`](Store::begin_read) and
/// [`begin_write`](Store::begin_write); callers use the provided
/// [`view`](Store::view) and [`update`](Store::update) methods, which bracket
/// the transaction so it is released on every exit path. `update` commits
/// iff the closure returns `Ok` and rolls back otherwise, leaving no effect.
///
/// Both closure methods are generic over the caller's error type so domain
/// errors pass through unchanged.
pub trait Store: Send + Sync {
    /// The transaction type for this engine.
    type Tx<'a>: Tx
    where
        Self: 'a;

    /// Begin a read-only transaction.
    fn begin_read(&self) -> KvResult<Self::Tx<'_>>;

    /// Begin a read-write transaction.
    fn begin_write(&self) -> KvResult<Self::Tx<'_>>;

    /// Run `f` against a read-only transaction.
    ///
    /// The closure receives a shared reference, so mutating operations are
    /// rejected at compile time; engines also refuse them dynamically with
    /// [`KvError::NotWritable`].
    fn view<'s, T, E, F>(&'s self, f: F) -> Result<T, E>
    where
        E: From<KvError>,
        F: FnOnce(&Self::Tx<'s>) -> Result<T, E>,
    {
        let tx = self.begin_read().map_err(E::from)?;
        let result = f(&tx);
        tx.rollback().map_err(E::from)?;
        result
    }

    /// Run `f` against a read-write transaction.
    ///
    /// Commits if `f` returns `Ok`; rolls back, discarding every mutation
    /// made by `f`, if it returns `Err`.
    fn update<'s, T, E, F>(&'s self, f: F) -> Result<T, E>
    where
        E: From<KvError>,
        F: FnOnce(&mut Self::Tx<'s>) -> Result<T, E>,
    {
        let mut tx = self.begin_write().map_err(E::from)?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit().map_err(E::from)?;
                Ok(value)
            }
            Err(err) => {
                drop(tx.rollback());
                Err(err)
            }
        }
    }
}

impl<S: Store> Store for Arc<S> {
    type Tx<'a>
        = S::Tx<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> KvResult<Self::Tx<'_>> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> KvResult<Self::Tx<'_>> {
        (**self).begin_write()
    }
}

/// A transaction over named buckets of ordered key-value pairs.
pub trait Tx {
    /// The cursor type for ordered iteration.
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Idempotently create a bucket.
    ///
    /// Required once per bucket before use, inside a write transaction.
    /// Inside a read-only transaction this succeeds as a no-op when the
    /// bucket already exists and fails with [`KvError::NotWritable`] when it
    /// does not.
    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> KvResult<()>;

    /// Get the value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`KvError::KeyNotFound`] if the key is absent,
    /// [`KvError::BucketNotFound`] if the bucket has not been created.
    fn get(&self, bucket: &[u8], key: &[u8]) -> KvResult<Vec<u8>>;

    /// Insert or replace the value stored under `key`.
    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Remove `key` from the bucket.
    ///
    /// Removing an absent key is a no-op; the return value reports whether a
    /// pair was actually removed.
    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> KvResult<bool>;

    /// Open a cursor over the bucket's pairs in ascending key order.
    fn cursor(&self, bucket: &[u8]) -> KvResult<Self::Cursor<'_>>;

    /// Whether this transaction accepts mutations.
    fn is_writable(&self) -> bool;

    /// Commit the transaction, finalizing all mutations.
    fn commit(self) -> KvResult<()>;

    /// Roll back the transaction, discarding all mutations.
    fn rollback(self) -> KvResult<()>;
}

/// A positional iterator over one bucket's pairs in sorted key order.
///
/// A fresh cursor is unpositioned: `next` positions at the first pair while
/// `prev` fails with [`KvError::CursorOutOfRange`]. The position clamps one
/// step past either end, so after `next` runs off the end a single `prev`
/// returns the last pair again (and symmetrically at the front). A failed
/// `seek` leaves the position unchanged.
pub trait Cursor {
    /// Position at the first pair and return it.
    fn first(&mut self) -> KvResult<Pair>;

    /// Position at the last pair and return it.
    fn last(&mut self) -> KvResult<Pair>;

    /// Position at the first pair whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// [`KvError::PrefixNotFound`] if no key carries the prefix.
    fn seek(&mut self, prefix: &[u8]) -> KvResult<Pair>;

    /// Advance to the next pair and return it.
    fn next(&mut self) -> KvResult<Pair>;

    /// Retreat to the previous pair and return it.
    fn prev(&mut self) -> KvResult<Pair>;
}
