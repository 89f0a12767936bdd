//! Redb table definitions and bucket key encoding.
//!
//! Redb requires static table names, so all pairs live in one physical table
//! and bucket names are prefixed onto keys. A second table records which
//! buckets have been created so that references to uncreated buckets are
//! reportable.

use redb::TableDefinition;

/// The physical table that stores all key-value pairs.
pub const DATA_TABLE: TableDefinition<'static, &[u8], &[u8]> = TableDefinition::new("basin_data");

/// The registry of created bucket names.
pub const BUCKETS_TABLE: TableDefinition<'static, &[u8], &[u8]> =
    TableDefinition::new("basin_buckets");

/// Separator byte between bucket name and key in the encoded key.
///
/// Bucket names are ASCII constants and must not contain this byte.
pub const KEY_SEPARATOR: u8 = 0x00;

/// Encode a bucket name and key into a physical key:
/// `<bucket><separator><key>`.
pub fn encode_key(bucket: &[u8], key: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(bucket.len() + 1 + key.len());
    encoded.extend_from_slice(bucket);
    encoded.push(KEY_SEPARATOR);
    encoded.extend_from_slice(key);
    encoded
}

/// Decode a physical key into its bucket name and original key.
///
/// Returns `None` if the key is malformed (missing separator).
pub fn decode_key(encoded: &[u8]) -> Option<(&[u8], &[u8])> {
    let sep = encoded.iter().position(|&b| b == KEY_SEPARATOR)?;
    Some((&encoded[..sep], &encoded[sep + 1..]))
}

/// The smallest physical key belonging to a bucket.
pub fn bucket_start_key(bucket: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(bucket.len() + 1);
    key.extend_from_slice(bucket);
    key.push(KEY_SEPARATOR);
    key
}

/// The first physical key past a bucket's range.
pub fn bucket_end_key(bucket: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(bucket.len() + 1);
    key.extend_from_slice(bucket);
    key.push(KEY_SEPARATOR + 1);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let encoded = encode_key(b"usersv1", b"user:123");
        let (bucket, key) = decode_key(&encoded).expect("well-formed key");
        assert_eq!(bucket, b"usersv1");
        assert_eq!(key, b"user:123");
    }

    #[test]
    fn encode_decode_empty_key() {
        let encoded = encode_key(b"config", b"");
        let (bucket, key) = decode_key(&encoded).expect("well-formed key");
        assert_eq!(bucket, b"config");
        assert_eq!(key, b"");
    }

    #[test]
    fn keys_from_one_bucket_are_adjacent() {
        let key_a = encode_key(b"usersv1", b"a");
        let key_b = encode_key(b"usersv1", b"b");
        let other = encode_key(b"zother", b"a");

        assert!(key_a < key_b);
        assert!(key_b < other);
    }

    #[test]
    fn bucket_range_covers_exactly_its_keys() {
        let start = bucket_start_key(b"usersv1");
        let end = bucket_end_key(b"usersv1");

        let inside = encode_key(b"usersv1", b"test");
        assert!(inside.as_slice() >= start.as_slice());
        assert!(inside.as_slice() < end.as_slice());

        let outside = encode_key(b"zother", b"test");
        assert!(outside.as_slice() >= end.as_slice());
    }
}
