//! Read and write transactions over buckets

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use parking_lot::RwLockReadGuard;

use crate::error::{Result, SigninError};
use crate::wal::Operation;

use super::cursor::{BucketIter, Cursor};
use super::{keys, Engine};

/// A read-only view of the store
///
/// Holds the commit lock shared for its lifetime, so nothing it reads can
/// change underneath it.
pub struct ReadTx<'e> {
    engine: &'e Engine,
    _guard: RwLockReadGuard<'e, ()>,
}

impl<'e> ReadTx<'e> {
    pub(super) fn new(engine: &'e Engine, guard: RwLockReadGuard<'e, ()>) -> Self {
        Self { engine, _guard: guard }
    }

    /// Whether a bucket exists
    pub fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        keys::validate_bucket_name(bucket)?;
        Ok(self.engine.get_internal(&keys::catalog_key(bucket))?.is_some())
    }

    /// Names of all buckets, in byte order
    pub fn buckets(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut lower = vec![keys::SEPARATOR];
        let mut inclusive = true;

        loop {
            let bound = if inclusive {
                Bound::Included(lower.as_slice())
            } else {
                Bound::Excluded(lower.as_slice())
            };
            let Some((key, _)) = self.engine.first_internal(bound)? else {
                break;
            };
            if key.first() != Some(&keys::SEPARATOR) {
                break;
            }
            names.push(String::from_utf8_lossy(&key[1..]).into_owned());
            lower = key;
            inclusive = false;
        }

        Ok(names)
    }

    /// Get a value by key
    pub fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.require_bucket(bucket)?;
        self.engine.get_internal(&keys::data_key(bucket, key))
    }

    /// Open a cursor over a bucket
    pub fn cursor(&self, bucket: &str) -> Result<Cursor<'_>> {
        self.require_bucket(bucket)?;
        Ok(Cursor::new(self.engine, keys::bucket_prefix(bucket)))
    }

    /// Lazy iterator over a bucket's entries, starting at the first key ≥ `start`
    pub fn iter_from(&self, bucket: &str, start: &[u8]) -> Result<BucketIter<'_>> {
        Ok(BucketIter::new(self.cursor(bucket)?, start.to_vec()))
    }

    /// Call `f` for every key of a bucket, in order
    ///
    /// Stops at the first error `f` returns.
    pub fn for_each_key<F>(&self, bucket: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        for entry in self.iter_from(bucket, b"")? {
            let (key, _) = entry?;
            f(&key)?;
        }
        Ok(())
    }

    fn require_bucket(&self, bucket: &str) -> Result<()> {
        if self.bucket_exists(bucket)? {
            Ok(())
        } else {
            Err(SigninError::BucketNotFound(bucket.to_string()))
        }
    }
}

/// A read-write transaction
///
/// Writes are buffered and only become visible to other transactions when
/// the engine commits them. Reads see the transaction's own writes.
pub struct WriteTx<'e> {
    engine: &'e Engine,
    batch: Vec<Operation>,
    new_buckets: HashSet<String>,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'e> WriteTx<'e> {
    pub(super) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            batch: Vec::new(),
            new_buckets: HashSet::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Whether a bucket exists (committed or created in this transaction)
    pub fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        keys::validate_bucket_name(bucket)?;
        if self.new_buckets.contains(bucket) {
            return Ok(true);
        }
        Ok(self.engine.get_internal(&keys::catalog_key(bucket))?.is_some())
    }

    /// Create a bucket unless it exists; returns true if it was created
    pub fn create_bucket_if_not_exists(&mut self, bucket: &str) -> Result<bool> {
        if self.bucket_exists(bucket)? {
            return Ok(false);
        }
        self.new_buckets.insert(bucket.to_string());
        self.batch.push(Operation::CreateBucket {
            name: bucket.to_string(),
        });
        Ok(true)
    }

    /// Get a value by key
    pub fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.require_bucket(bucket)?;
        let internal = keys::data_key(bucket, key);
        if let Some(value) = self.pending.get(&internal) {
            return Ok(Some(value.clone()));
        }
        self.engine.get_internal(&internal)
    }

    /// Put a key-value pair, replacing any existing value
    pub fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.require_bucket(bucket)?;
        keys::validate_key(key)?;

        self.pending.insert(keys::data_key(bucket, key), value.to_vec());
        self.batch.push(Operation::Put {
            bucket: bucket.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    pub(super) fn into_batch(self) -> Vec<Operation> {
        self.batch
    }

    fn require_bucket(&self, bucket: &str) -> Result<()> {
        if self.bucket_exists(bucket)? {
            Ok(())
        } else {
            Err(SigninError::BucketNotFound(bucket.to_string()))
        }
    }
}
