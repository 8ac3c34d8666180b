//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// In-memory table for recent writes
pub struct MemTable {
    /// Sorted entries
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,

    /// Approximate size in bytes (keys + values)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair (write lock), returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut data = self.data.write();
        let added = key.len() + value.len();
        let removed = data
            .insert(key.clone(), value)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);

        // Size only changes under the write lock, so load/store is race-free
        let size = self.size.load(Ordering::Acquire) + added - removed;
        self.size.store(size, Ordering::Release);
        size
    }

    /// First entry whose key satisfies the lower bound, in key order
    pub fn first_from(&self, lower: Bound<&[u8]>) -> Option<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    /// True when no entries are held
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Get an iterator over all entries (for flush)
    ///
    /// Returns a snapshot of the entries in sorted key order.
    pub fn iter(&self) -> MemTableIterator {
        let entries: Vec<_> = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MemTableIterator { entries: entries.into_iter() }
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::Release);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a snapshot of MemTable entries
pub struct MemTableIterator {
    entries: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl Iterator for MemTableIterator {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}
