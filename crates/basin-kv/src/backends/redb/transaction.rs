//! Redb transaction and cursor.
//!
//! Cursor calls translate directly into bounded range reads against Redb's
//! native ordered traversal, re-anchored at the cursor's current key. No
//! bucket contents are materialized in memory.

use std::ops::Bound;

use redb::{ReadTransaction, ReadableTable, WriteTransaction};

use crate::cursor::Pair;
use crate::store::{Cursor, KvError, KvResult, Tx};

use super::buckets::{
    bucket_end_key, bucket_start_key, decode_key, encode_key, BUCKETS_TABLE, DATA_TABLE,
};

/// A transaction for the Redb engine.
#[allow(clippy::large_enum_variant)]
pub enum RedbTx {
    /// A read-only transaction over a consistent snapshot.
    Read(ReadTransaction),
    /// The single in-flight read-write transaction.
    Write(WriteTransaction),
}

impl RedbTx {
    fn bucket_exists(&self, bucket: &[u8]) -> KvResult<bool> {
        match self {
            Self::Read(tx) => match tx.open_table(BUCKETS_TABLE) {
                Ok(t) => registry_contains(&t, bucket),
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(false),
                Err(e) => Err(KvError::Internal(e.to_string())),
            },
            Self::Write(tx) => match tx.open_table(BUCKETS_TABLE) {
                Ok(t) => registry_contains(&t, bucket),
                Err(e) => Err(KvError::Internal(e.to_string())),
            },
        }
    }

    fn require_bucket(&self, bucket: &[u8]) -> KvResult<()> {
        if self.bucket_exists(bucket)? {
            Ok(())
        } else {
            Err(KvError::BucketNotFound(String::from_utf8_lossy(bucket).into_owned()))
        }
    }

    /// Return the edge entry of a physical key range: the first entry when
    /// scanning forward, the last when scanning in reverse.
    fn edge_entry(
        &self,
        lo: Bound<&[u8]>,
        hi: Bound<&[u8]>,
        reverse: bool,
    ) -> KvResult<Option<Pair>> {
        match self {
            Self::Read(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => scan_edge(&t, lo, hi, reverse),
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
                Err(e) => Err(KvError::Internal(e.to_string())),
            },
            Self::Write(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => scan_edge(&t, lo, hi, reverse),
                Err(e) => Err(KvError::Internal(e.to_string())),
            },
        }
    }
}

fn registry_contains<T>(table: &T, bucket: &[u8]) -> KvResult<bool>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    match table.get(bucket) {
        Ok(entry) => Ok(entry.is_some()),
        Err(e) => Err(KvError::Internal(e.to_string())),
    }
}

fn table_get<T>(table: &T, encoded_key: &[u8]) -> KvResult<Vec<u8>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    match table.get(encoded_key) {
        Ok(Some(value)) => Ok(value.value().to_vec()),
        Ok(None) => Err(KvError::KeyNotFound),
        Err(e) => Err(KvError::Internal(e.to_string())),
    }
}

fn scan_edge<T>(
    table: &T,
    lo: Bound<&[u8]>,
    hi: Bound<&[u8]>,
    reverse: bool,
) -> KvResult<Option<Pair>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut range =
        table.range::<&[u8]>((lo, hi)).map_err(|e| KvError::Internal(e.to_string()))?;
    let entry = if reverse { range.next_back() } else { range.next() };
    match entry {
        Some(Ok((key, value))) => match decode_key(key.value()) {
            Some((_, logical_key)) => Ok(Some(Pair::new(logical_key, value.value()))),
            None => Err(KvError::Internal("malformed physical key".to_string())),
        },
        Some(Err(e)) => Err(KvError::Internal(e.to_string())),
        None => Ok(None),
    }
}

impl Tx for RedbTx {
    type Cursor<'a>
        = RedbCursor<'a>
    where
        Self: 'a;

    fn create_bucket_if_not_exists(&mut self, bucket: &[u8]) -> KvResult<()> {
        if let Self::Read(_) = self {
            return if self.bucket_exists(bucket)? {
                Ok(())
            } else {
                Err(KvError::NotWritable)
            };
        }

        let Self::Write(tx) = self else {
            return Err(KvError::NotWritable);
        };
        let mut t =
            tx.open_table(BUCKETS_TABLE).map_err(|e| KvError::Internal(e.to_string()))?;
        t.insert(bucket, b"".as_slice()).map_err(|e| KvError::Internal(e.to_string()))?;
        Ok(())
    }

    fn get(&self, bucket: &[u8], key: &[u8]) -> KvResult<Vec<u8>> {
        self.require_bucket(bucket)?;
        let encoded = encode_key(bucket, key);

        match self {
            Self::Read(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => table_get(&t, &encoded),
                // The bucket exists but nothing has been written anywhere yet.
                Err(redb::TableError::TableDoesNotExist(_)) => Err(KvError::KeyNotFound),
                Err(e) => Err(KvError::Internal(e.to_string())),
            },
            Self::Write(tx) => match tx.open_table(DATA_TABLE) {
                Ok(t) => table_get(&t, &encoded),
                Err(e) => Err(KvError::Internal(e.to_string())),
            },
        }
    }

    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> KvResult<()> {
        if !self.is_writable() {
            return Err(KvError::NotWritable);
        }
        self.require_bucket(bucket)?;

        let Self::Write(tx) = self else {
            return Err(KvError::NotWritable);
        };
        let encoded = encode_key(bucket, key);
        let mut t = tx.open_table(DATA_TABLE).map_err(|e| KvError::Internal(e.to_string()))?;
        t.insert(encoded.as_slice(), value).map_err(|e| KvError::Internal(e.to_string()))?;
        Ok(())
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> KvResult<bool> {
        if !self.is_writable() {
            return Err(KvError::NotWritable);
        }
        self.require_bucket(bucket)?;

        let Self::Write(tx) = self else {
            return Err(KvError::NotWritable);
        };
        let encoded = encode_key(bucket, key);
        let mut t = tx.open_table(DATA_TABLE).map_err(|e| KvError::Internal(e.to_string()))?;
        let result = match t.remove(encoded.as_slice()) {
            Ok(removed) => Ok(removed.is_some()),
            Err(e) => Err(KvError::Internal(e.to_string())),
        };
        result
    }

    fn cursor(&self, bucket: &[u8]) -> KvResult<Self::Cursor<'_>> {
        self.require_bucket(bucket)?;
        Ok(RedbCursor { tx: self, bucket: bucket.to_vec(), pos: Position::Unset })
    }

    fn is_writable(&self) -> bool {
        matches!(self, Self::Write(_))
    }

    fn commit(self) -> KvResult<()> {
        match self {
            Self::Read(_) => Ok(()),
            Self::Write(tx) => {
                tx.commit().map_err(|e| KvError::Transaction(e.to_string()))
            }
        }
    }

    fn rollback(self) -> KvResult<()> {
        match self {
            Self::Read(_) => Ok(()),
            Self::Write(tx) => {
                drop(tx.abort());
                Ok(())
            }
        }
    }
}

/// Cursor position within a bucket's pair sequence.
enum Position {
    /// Fresh cursor, not yet positioned.
    Unset,
    /// One step before the first pair.
    BeforeFirst,
    /// One step past the last pair.
    AfterLast,
    /// Positioned at the pair with this logical key.
    At(Vec<u8>),
}

/// A cursor over one bucket, backed by Redb's native ordered traversal.
///
/// Each call issues a bounded range read anchored at the current key, so
/// the cursor remains correct without holding table borrows across calls.
pub struct RedbCursor<'a> {
    tx: &'a RedbTx,
    bucket: Vec<u8>,
    pos: Position,
}

impl RedbCursor<'_> {
    fn bucket_bounds(&self) -> (Vec<u8>, Vec<u8>) {
        (bucket_start_key(&self.bucket), bucket_end_key(&self.bucket))
    }
}

impl Cursor for RedbCursor<'_> {
    fn first(&mut self) -> KvResult<Pair> {
        let (start, end) = self.bucket_bounds();
        match self.tx.edge_entry(
            Bound::Included(start.as_slice()),
            Bound::Excluded(end.as_slice()),
            false,
        )? {
            Some(pair) => {
                self.pos = Position::At(pair.key.clone());
                Ok(pair)
            }
            None => {
                self.pos = Position::BeforeFirst;
                Err(KvError::CursorOutOfRange)
            }
        }
    }

    fn last(&mut self) -> KvResult<Pair> {
        let (start, end) = self.bucket_bounds();
        match self.tx.edge_entry(
            Bound::Included(start.as_slice()),
            Bound::Excluded(end.as_slice()),
            true,
        )? {
            Some(pair) => {
                self.pos = Position::At(pair.key.clone());
                Ok(pair)
            }
            None => {
                self.pos = Position::AfterLast;
                Err(KvError::CursorOutOfRange)
            }
        }
    }

    fn seek(&mut self, prefix: &[u8]) -> KvResult<Pair> {
        let anchor = encode_key(&self.bucket, prefix);
        let end = bucket_end_key(&self.bucket);
        let found = self.tx.edge_entry(
            Bound::Included(anchor.as_slice()),
            Bound::Excluded(end.as_slice()),
            false,
        )?;

        // A failed seek leaves the position unchanged.
        match found {
            Some(pair) if pair.key.starts_with(prefix) => {
                self.pos = Position::At(pair.key.clone());
                Ok(pair)
            }
            _ => Err(KvError::PrefixNotFound),
        }
    }

    fn next(&mut self) -> KvResult<Pair> {
        match &self.pos {
            Position::Unset | Position::BeforeFirst => self.first(),
            Position::AfterLast => Err(KvError::CursorOutOfRange),
            Position::At(key) => {
                let anchor = encode_key(&self.bucket, key);
                let end = bucket_end_key(&self.bucket);
                match self.tx.edge_entry(
                    Bound::Excluded(anchor.as_slice()),
                    Bound::Excluded(end.as_slice()),
                    false,
                )? {
                    Some(pair) => {
                        self.pos = Position::At(pair.key.clone());
                        Ok(pair)
                    }
                    None => {
                        self.pos = Position::AfterLast;
                        Err(KvError::CursorOutOfRange)
                    }
                }
            }
        }
    }

    fn prev(&mut self) -> KvResult<Pair> {
        match &self.pos {
            Position::Unset | Position::BeforeFirst => {
                self.pos = Position::BeforeFirst;
                Err(KvError::CursorOutOfRange)
            }
            Position::AfterLast => self.last(),
            Position::At(key) => {
                let start = bucket_start_key(&self.bucket);
                let anchor = encode_key(&self.bucket, key);
                match self.tx.edge_entry(
                    Bound::Included(start.as_slice()),
                    Bound::Excluded(anchor.as_slice()),
                    true,
                )? {
                    Some(pair) => {
                        self.pos = Position::At(pair.key.clone());
                        Ok(pair)
                    }
                    None => {
                        self.pos = Position::BeforeFirst;
                        Err(KvError::CursorOutOfRange)
                    }
                }
            }
        }
    }
}
