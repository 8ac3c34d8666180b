//! StorageManager Tests
//!
//! Tests verify:
//! - Discovery of existing SSTables on open
//! - Newest-first reads across tables
//! - Merged ordered seeks
//! - Compaction

use std::ops::Bound;

use signlog::memtable::MemTable;
use signlog::storage::StorageManager;
use signlog::SigninError;
use tempfile::TempDir;

fn memtable_of(entries: &[(&str, &str)]) -> MemTable {
    let memtable = MemTable::new();
    for (key, value) in entries {
        memtable.put(key.as_bytes().to_vec(), value.as_bytes().to_vec());
    }
    memtable
}

#[test]
fn test_open_empty_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("sstables");

    let storage = StorageManager::open(&dir).unwrap();

    assert!(dir.is_dir());
    assert_eq!(storage.sstable_count(), 0);
    assert_eq!(storage.next_sstable_id(), 1);
    assert_eq!(storage.get(b"missing").unwrap(), None);
    assert_eq!(storage.first_from(Bound::Unbounded).unwrap(), None);
}

#[test]
fn test_flush_empty_memtable_fails() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    assert!(matches!(
        storage.flush(&MemTable::new()),
        Err(SigninError::Storage(_))
    ));
}

#[test]
fn test_newest_table_wins() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    storage.flush(&memtable_of(&[("a", "old"), ("b", "only")])).unwrap();
    storage.flush(&memtable_of(&[("a", "new")])).unwrap();

    assert_eq!(storage.sstable_count(), 2);
    assert_eq!(storage.get(b"a").unwrap(), Some(b"new".to_vec()));
    assert_eq!(storage.get(b"b").unwrap(), Some(b"only".to_vec()));
}

#[test]
fn test_first_from_merges_tables() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    storage.flush(&memtable_of(&[("a", "1"), ("c", "old")])).unwrap();
    storage.flush(&memtable_of(&[("b", "2"), ("c", "new")])).unwrap();

    let mut seen = Vec::new();
    let mut lower: Option<Vec<u8>> = None;
    loop {
        let bound = match &lower {
            Some(key) => Bound::Excluded(key.as_slice()),
            None => Bound::Unbounded,
        };
        let Some((key, value)) = storage.first_from(bound).unwrap() else {
            break;
        };
        seen.push((String::from_utf8(key.clone()).unwrap(), String::from_utf8(value).unwrap()));
        lower = Some(key);
    }

    assert_eq!(
        seen,
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("c".to_string(), "new".to_string()),
        ]
    );
}

#[test]
fn test_reopen_discovers_tables() {
    let temp = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(temp.path()).unwrap();
        storage.flush(&memtable_of(&[("k", "v1")])).unwrap();
        storage.flush(&memtable_of(&[("k", "v2")])).unwrap();
    }

    // Unrelated files are ignored
    std::fs::write(temp.path().join("notes.txt"), b"hello").unwrap();

    let storage = StorageManager::open(temp.path()).unwrap();
    assert_eq!(storage.sstable_count(), 2);
    assert_eq!(storage.next_sstable_id(), 3);
    assert_eq!(storage.get(b"k").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(storage.data_dir(), temp.path());
}

#[test]
fn test_compact_merges_into_one_table() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    storage.flush(&memtable_of(&[("a", "1"), ("b", "old")])).unwrap();
    storage.flush(&memtable_of(&[("b", "new"), ("c", "3")])).unwrap();
    storage.flush(&memtable_of(&[("d", "4")])).unwrap();

    let merged = storage.compact().unwrap().unwrap();

    assert_eq!(merged.entry_count, 4);
    assert_eq!(storage.sstable_count(), 1);
    assert_eq!(storage.get(b"b").unwrap(), Some(b"new".to_vec()));

    let files = std::fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(files, 1);

    // A single table has nothing to merge
    assert!(storage.compact().unwrap().is_none());
}

#[test]
fn test_compacted_table_survives_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(temp.path()).unwrap();
        storage.flush(&memtable_of(&[("x", "1")])).unwrap();
        storage.flush(&memtable_of(&[("y", "2")])).unwrap();
        storage.compact().unwrap();
    }

    let storage = StorageManager::open(temp.path()).unwrap();
    assert_eq!(storage.sstable_count(), 1);
    assert_eq!(storage.get(b"x").unwrap(), Some(b"1".to_vec()));
    assert_eq!(storage.get(b"y").unwrap(), Some(b"2".to_vec()));
}
