//! Tests for WAL Writer
//!
//! These tests verify:
//! - LSN generation and sequencing
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Truncation
//! - Integration with reader

use signlog::config::WalSyncStrategy;
use signlog::wal::{WalReader, WalWriter};

use super::{put, setup_temp_wal};

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    for i in 1..=50u64 {
        let lsn = writer.append(put(&format!("key{}", i), "v")).unwrap();
        assert_eq!(lsn, i);
    }
    assert_eq!(writer.current_lsn(), 51);
}

#[test]
fn test_sync_every_write() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(put("k1", "v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
    writer.append(put("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(put("a", "1")).unwrap();
    writer.append(put("b", "2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    writer.append(put("c", "3")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(put("d", "4")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);
    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_open_discards_previous_content() {
    let (_temp, wal_path) = setup_temp_wal();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(put("old", "x")).unwrap();
    }

    let writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), 0);
}

#[test]
fn test_truncate_resets_log() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(put("a", "1")).unwrap();
    writer.append(put("b", "2")).unwrap();
    writer.truncate().unwrap();

    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), 0);

    // Writes after truncation land at the start of the file
    writer.append(put("c", "3")).unwrap();
    let mut reader = WalReader::open(&wal_path).unwrap();
    let entry = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry.lsn, 1);
    assert_eq!(entry.batch, put("c", "3"));
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_written_batches_read_back_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    let mut batch = put("x", "1");
    batch.extend(put("y", "2"));
    writer.append(batch.clone()).unwrap();
    writer.append(put("z", "3")).unwrap();
    assert_eq!(writer.path(), wal_path.as_path());

    let entries: Vec<_> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].batch, batch);
    assert_eq!(entries[1].lsn, 2);
}
