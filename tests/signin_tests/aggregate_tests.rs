//! Aggregation tests
//!
//! Tests verify:
//! - Year statistics over half-open key ranges
//! - Undecodable values skipped without aborting a scan
//! - Week lookups with exact key matches
//! - Prefix and full-key scans, including their entry limit

use signlog::signin::{scan_all_keys, scan_prefix, week_logs, year_stats, DateKey};
use signlog::{SigninError, YearStats};
use tempfile::TempDir;

use super::{engine_with_bucket, record, store, store_raw, BUCKET};

#[test]
fn test_year_stats_of_empty_bucket_is_zero() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats, YearStats::default());
}

#[test]
fn test_year_stats_counts() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2017-03-01", &record(&["A", "B"], &["新人"], 2));
    store(&engine, "2017-03-08", &record(&["B", "C"], &[], 3));

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();

    assert_eq!(stats.num_of_people, 3);
    assert_eq!(stats.num_of_new, 1);
    assert_eq!(stats.num_of_time, 4);
    assert_eq!(stats.cup_size, 5);
}

#[test]
fn test_year_range_is_half_open() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2016-12-31", &record(&["before"], &[], 1));
    store(&engine, "2017-01-01", &record(&["first"], &[], 1));
    store(&engine, "2017-12-31", &record(&["last"], &[], 1));
    store(&engine, "2018-01-01", &record(&["after"], &[], 1));

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats.num_of_time, 2);
    assert_eq!(stats.num_of_people, 2);
    assert_eq!(stats.cup_size, 2);
}

#[test]
fn test_stored_cup_sizes_summed_as_is() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2017-05-01", &record(&["A"], &[], 3));
    store(&engine, "2017-05-02", &record(&["B"], &[], -2));
    store_raw(&engine, "2017-05-03", br#"{"names":["C"],"tags":[],"cup_size":-1}"#);

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats.cup_size, 0);
    assert_eq!(stats.num_of_time, 3);
}

#[test]
fn test_missing_cup_size_adds_zero() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store_raw(&engine, "2017-05-01", br#"{"names":["A"]}"#);
    store(&engine, "2017-05-02", &record(&["B"], &[], 7));

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats.cup_size, 7);
    assert_eq!(stats.num_of_time, 2);
}

#[test]
fn test_newcomers_counted_per_tag_not_per_person() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2017-05-01", &record(&["A"], &["新人 A"], 0));
    store(&engine, "2017-05-02", &record(&["A"], &["新人 A", "新人"], 0));

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats.num_of_new, 3);
    assert_eq!(stats.num_of_people, 1);
}

#[test]
fn test_corrupt_record_does_not_abort_scan() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2017-02-01", &record(&["A"], &[], 1));
    store_raw(&engine, "2017-02-02", b"{broken");
    store(&engine, "2017-02-03", &record(&["B"], &["新人"], 1));

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats.num_of_time, 2);
    assert_eq!(stats.num_of_people, 2);
    assert_eq!(stats.num_of_new, 1);
    assert_eq!(stats.cup_size, 2);
}

#[test]
fn test_aggregation_sees_flushed_and_fresh_records() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2017-04-01", &record(&["A"], &[], 1));
    engine.flush().unwrap();
    store(&engine, "2017-04-02", &record(&["B"], &[], 1));

    let stats = engine.view(|tx| year_stats(tx, BUCKET, 2017)).unwrap();
    assert_eq!(stats.num_of_people, 2);
}

#[test]
fn test_week_logs_in_window_order_with_gaps() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    // Outside the window on both sides
    store(&engine, "2017-08-27", &record(&["sun-before"], &[], 0));
    store(&engine, "2017-09-04", &record(&["mon-after"], &[], 0));
    // Inside, written out of order
    store(&engine, "2017-09-03", &record(&["sun"], &[], 0));
    store(&engine, "2017-08-28", &record(&["mon"], &[], 0));
    store(&engine, "2017-09-01", &record(&["fri"], &[], 0));
    store_raw(&engine, "2017-08-30", b"garbage");

    let day = DateKey::parse_strict("2017-09-01").unwrap();
    let logs = engine.view(|tx| week_logs(tx, BUCKET, &day)).unwrap();

    let names: Vec<&str> = logs.iter().map(|r| r.names[0].as_str()).collect();
    assert_eq!(names, vec!["mon", "fri", "sun"]);
}

#[test]
fn test_week_logs_of_empty_week() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store(&engine, "2017-01-01", &record(&["A"], &[], 0));

    let day = DateKey::parse_strict("2017-09-01").unwrap();
    let logs = engine.view(|tx| week_logs(tx, BUCKET, &day)).unwrap();
    assert!(logs.is_empty());
}

#[test]
fn test_scan_prefix_returns_raw_bytes() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    store_raw(&engine, "2016-12-31", b"old");
    store_raw(&engine, "2017-01-05", b"{ \"names\" : [] }");
    store_raw(&engine, "2017-07-01", b"not json");
    store_raw(&engine, "2018-01-01", b"new");

    let entries = engine
        .view(|tx| scan_prefix(tx, BUCKET, b"2017", 100))
        .unwrap();

    let keys: Vec<&[u8]> = entries.keys().map(Vec::as_slice).collect();
    assert_eq!(keys, vec![b"2017-01-05".as_slice(), b"2017-07-01".as_slice()]);
    assert_eq!(entries[b"2017-01-05".as_slice()], b"{ \"names\" : [] }".to_vec());
    assert_eq!(entries[b"2017-07-01".as_slice()], b"not json".to_vec());
}

#[test]
fn test_scan_all_keys_in_order() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    for key in ["2017-03-01", "2016-01-01", "2017-01-01"] {
        store_raw(&engine, key, b"{}");
    }

    let keys = engine.view(|tx| scan_all_keys(tx, BUCKET, 100)).unwrap();
    assert_eq!(
        keys,
        vec![b"2016-01-01".to_vec(), b"2017-01-01".to_vec(), b"2017-03-01".to_vec()]
    );

    let empty = TempDir::new().unwrap();
    let engine = engine_with_bucket(&empty);
    assert!(engine.view(|tx| scan_all_keys(tx, BUCKET, 100)).unwrap().is_empty());
}

#[test]
fn test_scan_limits() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);
    for day in 1..=5 {
        store_raw(&engine, &format!("2017-01-{:02}", day), b"{}");
    }

    assert_eq!(engine.view(|tx| scan_all_keys(tx, BUCKET, 5)).unwrap().len(), 5);
    assert!(matches!(
        engine.view(|tx| scan_all_keys(tx, BUCKET, 4)),
        Err(SigninError::ScanLimitExceeded { limit: 4 })
    ));
    assert!(matches!(
        engine.view(|tx| scan_prefix(tx, BUCKET, b"2017-01", 2)),
        Err(SigninError::ScanLimitExceeded { limit: 2 })
    ));
}

#[test]
fn test_missing_bucket_is_store_error() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_bucket(&temp);

    assert!(matches!(
        engine.view(|tx| year_stats(tx, "nowhere", 2017)),
        Err(SigninError::BucketNotFound(_))
    ));
}
