//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from clean and empty logs
//! - Partial tails truncated on disk
//! - Corrupted entries counted and skipped
//! - Verify mode leaves the file untouched

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use signlog::config::WalSyncStrategy;
use signlog::wal::{WalEntry, WalRecovery, WalWriter, HEADER_SIZE};

use super::{put, setup_temp_wal};

fn write_entries(path: &Path, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer.append(put(&format!("key{}", i), &format!("value{}", i))).unwrap();
    }
}

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_clean_log() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 10);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 10);
    assert_eq!(entries[4].batch, put("key4", "value4"));
}

#[test]
fn test_recover_truncates_partial_tail() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 3);
    let clean_len = std::fs::metadata(&wal_path).unwrap().len();

    let torn = WalEntry::new(4, put("key3", "value3")).serialize().unwrap();
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&torn[..torn.len() / 2]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 3);
    assert!(result.was_truncated);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), clean_len);

    // A second pass finds nothing left to repair
    let (_, again) = WalRecovery::recover(&wal_path).unwrap();
    assert!(!again.was_truncated);
    assert_eq!(again.entries_recovered, 3);
}

#[test]
fn test_recover_skips_corrupt_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut corrupt = WalEntry::new(2, put("b", "2")).serialize().unwrap();
    corrupt[HEADER_SIZE] ^= 0xFF;

    let mut file = File::create(&wal_path).unwrap();
    file.write_all(&WalEntry::new(1, put("a", "1")).serialize().unwrap()).unwrap();
    file.write_all(&corrupt).unwrap();
    file.write_all(&WalEntry::new(3, put("c", "3")).serialize().unwrap()).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 3);
    assert_eq!(
        entries.iter().map(|e| e.lsn).collect::<Vec<_>>(),
        vec![1, 3]
    );
}

#[test]
fn test_verify_does_not_modify() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 2);

    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);
    let len_before = std::fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(result.entries_recovered, 2);
    assert!(result.was_truncated);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), len_before);
}
