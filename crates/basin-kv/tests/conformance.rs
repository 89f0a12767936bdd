//! Behavioral conformance suite run against every engine.
//!
//! Both engines must yield identical observable results (values, errors,
//! iteration order) for every behavior here, so domain services stay
//! engine-agnostic.

use basin_kv::{Cursor, KvError, KvResult, MemStore, RedbStore, Store, Tx};

fn run_kv_suite<S: Store>(store: &S) {
    put_get_round_trip(store);
    overwrite_replaces_value(store);
    delete_semantics(store);
    uncreated_bucket_is_an_error(store);
    bucket_creation_is_idempotent(store);
    read_transactions_are_not_writable(store);
    cursor_orders_pairs(store);
    cursor_clamps_at_both_ends(store);
    seek_finds_prefix(store);
    empty_bucket_cursor(store);
    failed_update_leaves_no_effect(store);
}

fn put_get_round_trip<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"roundtrip")?;
            tx.put(b"roundtrip", b"key", b"value")
        })
        .expect("write");

    let value: Vec<u8> = store.view(|tx| tx.get(b"roundtrip", b"key")).expect("read");
    assert_eq!(value, b"value");
}

fn overwrite_replaces_value<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"overwrite")?;
            tx.put(b"overwrite", b"key", b"old")?;
            tx.put(b"overwrite", b"key", b"new")
        })
        .expect("write");

    let value: Vec<u8> = store.view(|tx| tx.get(b"overwrite", b"key")).expect("read");
    assert_eq!(value, b"new");
}

fn delete_semantics<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"tombstone")?;
            tx.put(b"tombstone", b"key", b"value")
        })
        .expect("seed");

    let removed = store.update(|tx| tx.delete(b"tombstone", b"key")).expect("delete");
    assert!(removed);

    let err = store.view(|tx| tx.get(b"tombstone", b"key")).expect_err("key must be gone");
    assert!(matches!(err, KvError::KeyNotFound));

    // Deleting an absent key is a no-op, reported through the return value.
    let removed = store.update(|tx| tx.delete(b"tombstone", b"key")).expect("delete absent");
    assert!(!removed);
}

fn uncreated_bucket_is_an_error<S: Store>(store: &S) {
    let err = store.view(|tx| tx.get(b"never_created", b"k")).expect_err("get must fail");
    assert!(matches!(err, KvError::BucketNotFound(_)));

    let err = store
        .update(|tx| tx.put(b"never_created", b"k", b"v"))
        .expect_err("put must fail");
    assert!(matches!(err, KvError::BucketNotFound(_)));

    let err: KvError = store
        .view(|tx| tx.cursor(b"never_created").map(|_| ()))
        .expect_err("cursor must fail");
    assert!(matches!(err, KvError::BucketNotFound(_)));
}

fn bucket_creation_is_idempotent<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"idempotent")?;
            tx.create_bucket_if_not_exists(b"idempotent")?;
            tx.put(b"idempotent", b"k", b"v")
        })
        .expect("first create");

    // Recreating must not clobber existing contents.
    store
        .update(|tx| tx.create_bucket_if_not_exists(b"idempotent"))
        .expect("second create");

    let value: Vec<u8> = store.view(|tx| tx.get(b"idempotent", b"k")).expect("read");
    assert_eq!(value, b"v");

    // Inside a read-only transaction, creating an existing bucket is a
    // no-op; a missing one cannot be created.
    let mut tx = store.begin_read().expect("begin read");
    tx.create_bucket_if_not_exists(b"idempotent").expect("existing bucket in read tx");
    assert!(matches!(
        tx.create_bucket_if_not_exists(b"missing_in_view"),
        Err(KvError::NotWritable)
    ));
    tx.rollback().expect("rollback");
}

fn read_transactions_are_not_writable<S: Store>(store: &S) {
    let writable = store.view(|tx| Ok::<bool, KvError>(tx.is_writable())).expect("view");
    assert!(!writable);

    let writable = store.update(|tx| Ok::<bool, KvError>(tx.is_writable())).expect("update");
    assert!(writable);
}

fn cursor_orders_pairs<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"ordered")?;
            for key in [b"delta".as_slice(), b"alpha", b"echo", b"charlie", b"bravo"] {
                tx.put(b"ordered", key, b"x")?;
            }
            Ok::<(), KvError>(())
        })
        .expect("seed");

    let keys: Vec<Vec<u8>> = store
        .view(|tx| -> KvResult<Vec<Vec<u8>>> {
            let mut cursor = tx.cursor(b"ordered")?;
            let mut keys = Vec::new();
            let mut entry = cursor.first();
            while let Ok(pair) = entry {
                keys.push(pair.key);
                entry = cursor.next();
            }
            Ok(keys)
        })
        .expect("walk");

    assert_eq!(
        keys,
        vec![
            b"alpha".to_vec(),
            b"bravo".to_vec(),
            b"charlie".to_vec(),
            b"delta".to_vec(),
            b"echo".to_vec(),
        ]
    );
}

fn cursor_clamps_at_both_ends<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"clamped")?;
            tx.put(b"clamped", b"a", b"1")?;
            tx.put(b"clamped", b"b", b"2")
        })
        .expect("seed");

    store
        .view(|tx| -> KvResult<()> {
            let mut cursor = tx.cursor(b"clamped")?;

            // A fresh cursor is unpositioned: prev fails, next lands on the
            // first pair.
            assert!(matches!(cursor.prev(), Err(KvError::CursorOutOfRange)));
            assert_eq!(cursor.next()?.key, b"a");

            // Running off the end clamps one step past it; a single prev
            // recovers the last pair.
            assert_eq!(cursor.last()?.key, b"b");
            assert!(matches!(cursor.next(), Err(KvError::CursorOutOfRange)));
            assert!(matches!(cursor.next(), Err(KvError::CursorOutOfRange)));
            assert_eq!(cursor.prev()?.key, b"b");

            // Symmetrically at the front.
            assert_eq!(cursor.first()?.key, b"a");
            assert!(matches!(cursor.prev(), Err(KvError::CursorOutOfRange)));
            assert!(matches!(cursor.prev(), Err(KvError::CursorOutOfRange)));
            assert_eq!(cursor.next()?.key, b"a");
            Ok(())
        })
        .expect("walk");
}

fn seek_finds_prefix<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"seek")?;
            tx.put(b"seek", b"a", b"1")?;
            tx.put(b"seek", b"ab", b"2")?;
            tx.put(b"seek", b"abc", b"3")?;
            tx.put(b"seek", b"abcd", b"4")?;
            tx.put(b"seek", b"abcde", b"5")?;
            tx.put(b"seek", b"bcd", b"6")?;
            tx.put(b"seek", b"cd", b"7")
        })
        .expect("seed");

    store
        .view(|tx| -> KvResult<()> {
            let mut cursor = tx.cursor(b"seek")?;

            let hit = cursor.seek(b"abc")?;
            assert_eq!((hit.key.as_slice(), hit.value.as_slice()), (b"abc".as_slice(), b"3".as_slice()));

            let after = cursor.next()?;
            assert_eq!(after.key, b"abcd");
            assert_eq!(after.value, b"4");

            let back = cursor.prev()?;
            assert_eq!(back.key, b"abc");
            assert_eq!(back.value, b"3");

            // A failed seek leaves the position where it was.
            assert!(matches!(cursor.seek(b"zzz"), Err(KvError::PrefixNotFound)));
            assert_eq!(cursor.next()?.key, b"abcd");
            Ok(())
        })
        .expect("seek walk");
}

fn empty_bucket_cursor<S: Store>(store: &S) {
    store
        .update(|tx| tx.create_bucket_if_not_exists(b"empty"))
        .expect("create");

    store
        .view(|tx| -> KvResult<()> {
            let mut cursor = tx.cursor(b"empty")?;
            assert!(matches!(cursor.first(), Err(KvError::CursorOutOfRange)));
            assert!(matches!(cursor.last(), Err(KvError::CursorOutOfRange)));
            assert!(matches!(cursor.seek(b"a"), Err(KvError::PrefixNotFound)));
            Ok(())
        })
        .expect("empty walk");
}

fn failed_update_leaves_no_effect<S: Store>(store: &S) {
    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"atomic")?;
            tx.put(b"atomic", b"stable", b"before")
        })
        .expect("seed");

    let result: Result<(), KvError> = store.update(|tx| {
        tx.put(b"atomic", b"stable", b"after")?;
        tx.put(b"atomic", b"extra", b"junk")?;
        Err(KvError::Internal("caller failed".to_string()))
    });
    assert!(result.is_err());

    let value: Vec<u8> = store.view(|tx| tx.get(b"atomic", b"stable")).expect("read");
    assert_eq!(value, b"before");

    let err = store.view(|tx| tx.get(b"atomic", b"extra")).expect_err("must be rolled back");
    assert!(matches!(err, KvError::KeyNotFound));
}

/// Run an identical operation script against a store, recording every
/// observable outcome as a string.
fn observe_script<S: Store>(store: &S) -> Vec<String> {
    let mut log = Vec::new();

    let result: Result<(), KvError> = store.update(|tx| {
        tx.create_bucket_if_not_exists(b"script")?;
        tx.put(b"script", b"ab", b"2")?;
        tx.put(b"script", b"a", b"1")?;
        tx.put(b"script", b"b", b"3")?;
        tx.delete(b"script", b"ab")?;
        Ok(())
    });
    log.push(format!("setup: {result:?}"));

    store
        .view(|tx| -> KvResult<()> {
            log.push(format!("get a: {:?}", tx.get(b"script", b"a")));
            log.push(format!("get ab: {:?}", tx.get(b"script", b"ab")));

            let mut cursor = tx.cursor(b"script")?;
            log.push(format!("first: {:?}", cursor.first()));
            log.push(format!("next: {:?}", cursor.next()));
            log.push(format!("next: {:?}", cursor.next()));
            log.push(format!("prev: {:?}", cursor.prev()));
            log.push(format!("seek b: {:?}", cursor.seek(b"b")));
            log.push(format!("seek q: {:?}", cursor.seek(b"q")));
            Ok(())
        })
        .expect("script view");

    log
}

#[test]
fn memory_engine_conformance() {
    let store = MemStore::new();
    run_kv_suite(&store);
}

#[test]
fn redb_engine_conformance() {
    let store = RedbStore::in_memory().expect("create in-memory store");
    run_kv_suite(&store);
}

#[test]
fn redb_engine_conformance_on_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = RedbStore::open(dir.path().join("kv.redb")).expect("open store");
    run_kv_suite(&store);
}

#[test]
fn engines_agree_on_script() {
    let mem = MemStore::new();
    let redb = RedbStore::in_memory().expect("create in-memory store");
    assert_eq!(observe_script(&mem), observe_script(&redb));
}

#[test]
fn redb_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("kv.redb");

    {
        let store = RedbStore::open(&path).expect("open store");
        store
            .update(|tx| {
                tx.create_bucket_if_not_exists(b"durable")?;
                tx.put(b"durable", b"key", b"survives")
            })
            .expect("write");
    }

    let store = RedbStore::open(&path).expect("reopen store");
    let value: Vec<u8> = store.view(|tx| tx.get(b"durable", b"key")).expect("read");
    assert_eq!(value, b"survives");
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nested").join("deeper").join("kv.redb");
    let store = RedbStore::open(&path).expect("open store with missing parents");

    store
        .update(|tx| {
            tx.create_bucket_if_not_exists(b"b")?;
            tx.put(b"b", b"k", b"v")
        })
        .expect("write");
    assert!(path.exists());
}
