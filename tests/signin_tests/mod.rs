//! Sign-in core test suite: date keys, records, aggregation, request
//! validation and the service.

mod aggregate_tests;
mod date_key_tests;

use signlog::{DailyRecord, Engine};
use tempfile::TempDir;

const BUCKET: &str = "tianjin_nankai";

/// Engine with one empty bucket
fn engine_with_bucket(temp: &TempDir) -> Engine {
    let engine = Engine::open_path(temp.path()).unwrap();
    engine.create_bucket_if_not_exists(BUCKET).unwrap();
    engine
}

fn record(names: &[&str], tags: &[&str], cup_size: i64) -> DailyRecord {
    DailyRecord {
        names: names.iter().map(|s| s.to_string()).collect(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        comment: String::new(),
        cup_size,
    }
}

fn store(engine: &Engine, key: &str, record: &DailyRecord) {
    store_raw(engine, key, &record.encode().unwrap());
}

fn store_raw(engine: &Engine, key: &str, bytes: &[u8]) {
    engine
        .update(|tx| tx.put(BUCKET, key.as_bytes(), bytes))
        .unwrap();
}
