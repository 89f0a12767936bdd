//! Engine-independent ordered cursor over a fixed snapshot of pairs.

use crate::store::{Cursor, KvError, KvResult};

/// A key-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// The key.
    pub key: Vec<u8>,
    /// The value.
    pub value: Vec<u8>,
}

impl Pair {
    /// Create a new pair from byte slices.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// A [`Cursor`] over a fixed snapshot of pairs.
///
/// Used by the in-memory engine and available to any engine without native
/// ordered iteration. The snapshot is taken at construction; later bucket
/// mutation is not reflected.
pub struct StaticCursor {
    /// Current position. -1 is one step before the first pair and
    /// `pairs.len()` one step past the last; advancing clamps to that range.
    idx: isize,
    pairs: Vec<Pair>,
}

impl StaticCursor {
    /// Create a cursor over `pairs`, destructively sorting them into
    /// ascending key order. The sort is a one-time cost per cursor.
    #[must_use]
    pub fn new(mut pairs: Vec<Pair>) -> Self {
        pairs.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        Self { idx: -1, pairs }
    }

    fn pair_at_position(&self) -> KvResult<Pair> {
        if self.idx < 0 {
            return Err(KvError::CursorOutOfRange);
        }
        match self.pairs.get(self.idx as usize) {
            Some(pair) => Ok(pair.clone()),
            None => Err(KvError::CursorOutOfRange),
        }
    }
}

impl Cursor for StaticCursor {
    fn first(&mut self) -> KvResult<Pair> {
        self.idx = 0;
        self.pair_at_position()
    }

    fn last(&mut self) -> KvResult<Pair> {
        self.idx = self.pairs.len() as isize - 1;
        self.pair_at_position()
    }

    fn seek(&mut self, prefix: &[u8]) -> KvResult<Pair> {
        // TODO: binary-search the sorted pairs instead of scanning.
        for (i, pair) in self.pairs.iter().enumerate() {
            if pair.key.starts_with(prefix) {
                self.idx = i as isize;
                return Ok(pair.clone());
            }
        }
        Err(KvError::PrefixNotFound)
    }

    fn next(&mut self) -> KvResult<Pair> {
        self.idx = (self.idx + 1).min(self.pairs.len() as isize);
        self.pair_at_position()
    }

    fn prev(&mut self) -> KvResult<Pair> {
        self.idx = (self.idx - 1).max(-1);
        self.pair_at_position()
    }
}
