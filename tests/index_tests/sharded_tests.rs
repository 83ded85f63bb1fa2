//! ShardedIndex Tests
//!
//! Tests verify:
//! - Basic get/put operations
//! - Overwrite semantics
//! - Prefix scans
//! - Shard count rounding
//! - Concurrent access patterns

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use durakv::index::ShardedIndex;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_index_is_empty() {
    let index = ShardedIndex::new(16);
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());
}

#[test]
fn test_put_and_get() {
    let index = ShardedIndex::new(16);

    assert_eq!(index.put(Bytes::from("key1"), Bytes::from("value1")), None);

    assert_eq!(index.get(b"key1"), Some(Bytes::from("value1")));
    assert_eq!(index.get(b"missing"), None);
}

#[test]
fn test_put_overwrites_existing() {
    let index = ShardedIndex::new(16);

    index.put(Bytes::from("key"), Bytes::from("old"));
    let previous = index.put(Bytes::from("key"), Bytes::from("new"));

    assert_eq!(previous, Some(Bytes::from("old")));
    assert_eq!(index.get(b"key"), Some(Bytes::from("new")));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_empty_value_is_present() {
    let index = ShardedIndex::new(4);
    index.put(Bytes::from("k"), Bytes::new());

    assert_eq!(index.get(b"k"), Some(Bytes::new()));
}

#[test]
fn test_shard_count_rounds_to_power_of_two() {
    assert_eq!(ShardedIndex::new(0).shard_count(), 2);
    assert_eq!(ShardedIndex::new(1).shard_count(), 2);
    assert_eq!(ShardedIndex::new(5).shard_count(), 8);
    assert_eq!(ShardedIndex::new(64).shard_count(), 64);
}

// =============================================================================
// Prefix Scan Tests
// =============================================================================

#[test]
fn test_prefix_scan_matches_only_prefix() {
    let index = ShardedIndex::new(8);
    index.put(Bytes::from("a1"), Bytes::from("va1"));
    index.put(Bytes::from("a2"), Bytes::from("va2"));
    index.put(Bytes::from("b1"), Bytes::from("vb1"));

    let values: HashSet<Bytes> = index.prefix_scan(b"a").into_iter().collect();

    let expected: HashSet<Bytes> = [Bytes::from("va1"), Bytes::from("va2")].into_iter().collect();
    assert_eq!(values, expected);
}

#[test]
fn test_prefix_scan_empty_prefix_returns_all() {
    let index = ShardedIndex::new(8);
    for i in 0..50 {
        index.put(Bytes::from(format!("k{}", i)), Bytes::from(format!("v{}", i)));
    }

    assert_eq!(index.prefix_scan(b"").len(), 50);
}

#[test]
fn test_prefix_scan_no_match() {
    let index = ShardedIndex::new(8);
    index.put(Bytes::from("abc"), Bytes::from("1"));

    assert!(index.prefix_scan(b"abcd").is_empty());
    assert!(index.prefix_scan(b"z").is_empty());
}

#[test]
fn test_snapshot_contains_all_pairs() {
    let index = ShardedIndex::new(4);
    index.put(Bytes::from("x"), Bytes::from("1"));
    index.put(Bytes::from("y"), Bytes::from("2"));

    let snapshot = index.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get(&b"y"[..]), Some(&Bytes::from("2")));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_puts_distinct_keys() {
    let index = Arc::new(ShardedIndex::new(16));
    let mut handles = Vec::new();

    for t in 0..8 {
        let index = Arc::clone(&index);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                index.put(
                    Bytes::from(format!("t{}_k{}", t, i)),
                    Bytes::from(format!("t{}_v{}", t, i)),
                );
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.len(), 8 * 500);
    assert_eq!(index.get(b"t3_k499"), Some(Bytes::from("t3_v499")));
}

#[test]
fn test_readers_never_see_torn_values() {
    let index = Arc::new(ShardedIndex::new(4));
    index.put(Bytes::from("hot"), Bytes::from(vec![b'a'; 256]));

    let writer = {
        let index = Arc::clone(&index);
        thread::spawn(move || {
            for i in 0..2000 {
                let fill = if i % 2 == 0 { b'b' } else { b'a' };
                index.put(Bytes::from("hot"), Bytes::from(vec![fill; 256]));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for _ in 0..2000 {
                    let value = index.get(b"hot").unwrap();
                    assert_eq!(value.len(), 256);
                    assert!(value.iter().all(|b| *b == value[0]));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}
