//! MemTable Tests
//!
//! Tests verify:
//! - Put/get and overwrite semantics
//! - Size tracking
//! - Sorted iteration and bounded lookups
//! - Clear functionality
//! - Concurrent access patterns

use std::ops::Bound;
use std::sync::Arc;
use std::thread;

use signlog::memtable::MemTable;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
    assert!(memtable.first_from(Bound::Unbounded).is_none());
}

#[test]
fn test_put_and_get() {
    let memtable = MemTable::new();

    memtable.put(b"key1".to_vec(), b"value1".to_vec());

    assert_eq!(memtable.get(b"key1"), Some(b"value1".to_vec()));
    assert_eq!(memtable.get(b"missing"), None);
}

#[test]
fn test_put_overwrites_existing() {
    let memtable = MemTable::new();

    memtable.put(b"key".to_vec(), b"old".to_vec());
    memtable.put(b"key".to_vec(), b"newer".to_vec());

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get(b"key"), Some(b"newer".to_vec()));
}

#[test]
fn test_empty_value_is_stored() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), Vec::new());
    assert_eq!(memtable.get(b"key"), Some(Vec::new()));
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_tracks_keys_and_values() {
    let memtable = MemTable::new();

    assert_eq!(memtable.put(b"abc".to_vec(), b"12345".to_vec()), 8);
    assert_eq!(memtable.put(b"de".to_vec(), b"1".to_vec()), 11);
    assert_eq!(memtable.size(), 11);
}

#[test]
fn test_size_after_overwrite() {
    let memtable = MemTable::new();

    memtable.put(b"key".to_vec(), b"long value".to_vec());
    memtable.put(b"key".to_vec(), b"v".to_vec());

    assert_eq!(memtable.size(), 4);
}

#[test]
fn test_should_flush() {
    let memtable = MemTable::new();
    memtable.put(vec![b'k'; 10], vec![b'v'; 90]);

    assert!(memtable.should_flush(100));
    assert!(memtable.should_flush(50));
    assert!(!memtable.should_flush(101));
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_iter_is_sorted() {
    let memtable = MemTable::new();
    for key in ["2017-09-03", "2017-01-01", "2017-12-31", "2017-06-21"] {
        memtable.put(key.as_bytes().to_vec(), b"x".to_vec());
    }

    let keys: Vec<Vec<u8>> = memtable.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            b"2017-01-01".to_vec(),
            b"2017-06-21".to_vec(),
            b"2017-09-03".to_vec(),
            b"2017-12-31".to_vec(),
        ]
    );
}

#[test]
fn test_iter_is_a_snapshot() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());

    let iter = memtable.iter();
    memtable.put(b"b".to_vec(), b"2".to_vec());

    assert_eq!(iter.count(), 1);
}

#[test]
fn test_first_from_bounds() {
    let memtable = MemTable::new();
    memtable.put(b"b".to_vec(), b"2".to_vec());
    memtable.put(b"d".to_vec(), b"4".to_vec());

    let first = |bound| memtable.first_from(bound).map(|(k, _)| k);

    assert_eq!(first(Bound::Unbounded), Some(b"b".to_vec()));
    assert_eq!(first(Bound::Included(b"b".as_slice())), Some(b"b".to_vec()));
    assert_eq!(first(Bound::Excluded(b"b".as_slice())), Some(b"d".to_vec()));
    assert_eq!(first(Bound::Included(b"c".as_slice())), Some(b"d".to_vec()));
    assert_eq!(first(Bound::Excluded(b"d".as_slice())), None);
}

// =============================================================================
// Clear Tests
// =============================================================================

#[test]
fn test_clear() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.put(b"b".to_vec(), b"2".to_vec());

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.get(b"a"), None);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let memtable = Arc::new(MemTable::new());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let memtable = Arc::clone(&memtable);
            thread::spawn(move || {
                for i in 0..250 {
                    let key = format!("t{}-{:04}", t, i).into_bytes();
                    memtable.put(key, b"v".to_vec());
                }
            })
        })
        .collect();

    let reader = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for _ in 0..100 {
                let _ = memtable.first_from(Bound::Unbounded);
                let _ = memtable.entry_count();
            }
        })
    };

    for handle in writers {
        handle.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(memtable.entry_count(), 1000);
    // every key is 7 bytes, every value 1
    assert_eq!(memtable.size(), 1000 * 8);
}
