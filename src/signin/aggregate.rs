//! Range scans and aggregation over a bucket
//!
//! All functions run inside a read transaction, make a single forward pass
//! and return empty/zero results for empty ranges. Values that do not
//! decode as a record are skipped with a warning.

use std::collections::{BTreeMap, HashSet};

use crate::engine::ReadTx;
use crate::error::{Result, SigninError};

use super::date_key::{year_range, DateKey};
use super::record::{DailyRecord, RecordTally, YearStats};

/// Visit every decodable record with `min ≤ key < max`
fn fold_range<F>(tx: &ReadTx<'_>, bucket: &str, min: &str, max: &str, mut f: F) -> Result<()>
where
    F: FnMut(RecordTally),
{
    for entry in tx.iter_from(bucket, min.as_bytes())? {
        let (key, value) = entry?;
        if key.as_slice() >= max.as_bytes() {
            break;
        }
        match RecordTally::decode(&value) {
            Some(record) => f(record),
            None => tracing::warn!(
                "Skipping undecodable record {}/{}",
                bucket,
                String::from_utf8_lossy(&key)
            ),
        }
    }
    Ok(())
}

/// Year totals for one bucket
pub fn year_stats(tx: &ReadTx<'_>, bucket: &str, year: i32) -> Result<YearStats> {
    let (min, max) = year_range(year)?;

    let mut stats = YearStats::default();
    let mut people: HashSet<String> = HashSet::new();

    fold_range(tx, bucket, &min, &max, |record| {
        stats.cup_size += record.cup_size;
        stats.num_of_time += record.names.len() as u64;
        stats.num_of_new += record.newcomer_tags() as u64;
        people.extend(record.names);
    })?;

    stats.num_of_people = people.len() as u64;
    Ok(stats)
}

/// Records of the week containing `day`, Monday first, missing days omitted
pub fn week_logs(tx: &ReadTx<'_>, bucket: &str, day: &DateKey) -> Result<Vec<DailyRecord>> {
    let mut cursor = tx.cursor(bucket)?;
    let mut logs = Vec::with_capacity(7);

    for date in day.week()? {
        let key = date.key();
        // seek lands on the next stored day when this one is missing
        let Some((found, value)) = cursor.seek(key.as_bytes())? else {
            continue;
        };
        if found != key.as_bytes() {
            continue;
        }
        match DailyRecord::decode(&value) {
            Some(record) => logs.push(record),
            None => tracing::warn!("Skipping undecodable record {}/{}", bucket, key),
        }
    }

    Ok(logs)
}

/// Raw entries whose key starts with `prefix`, at most `limit` of them
pub fn scan_prefix(
    tx: &ReadTx<'_>,
    bucket: &str,
    prefix: &[u8],
    limit: usize,
) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
    let mut entries = BTreeMap::new();

    for entry in tx.iter_from(bucket, prefix)? {
        let (key, value) = entry?;
        if !key.starts_with(prefix) {
            break;
        }
        if entries.len() == limit {
            return Err(SigninError::ScanLimitExceeded { limit });
        }
        entries.insert(key, value);
    }

    Ok(entries)
}

/// Every key of a bucket in order, at most `limit` of them
pub fn scan_all_keys(tx: &ReadTx<'_>, bucket: &str, limit: usize) -> Result<Vec<Vec<u8>>> {
    let mut keys = Vec::new();
    tx.for_each_key(bucket, |key| {
        if keys.len() == limit {
            return Err(SigninError::ScanLimitExceeded { limit });
        }
        keys.push(key.to_vec());
        Ok(())
    })?;
    Ok(keys)
}
