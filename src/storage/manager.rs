//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Merge SSTables for ordered seeks
//! - Create new SSTables from MemTable flushes
//! - Compact all SSTables into one

use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{Result, SigninError};
use crate::memtable::MemTable;

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `next_sstable_id`: Atomic counter (lock-free)
/// - All methods use `&self` (no exclusive access needed)
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<SSTableReader>>,

    /// Next ID for creating new SSTables (atomic, lock-free)
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing SSTable files
    /// 3. Open readers for each (loads indexes into RAM, checks data CRC)
    /// 4. Order by ID descending (newest first)
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    sstable_ids.push(id);
                }
            }
        }

        // Newest first (highest ID first)
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for id in &sstable_ids {
            let mut reader = SSTableReader::open(&Self::sstable_path_with_dir(path, *id))?;
            reader.verify_checksum()?;
            sstables.push(reader);
        }

        // Next ID = max + 1, or 1 if no SSTables exist
        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);

        tracing::debug!(
            "Storage opened at {} with {} sstable(s)",
            path.display(),
            sstables.len()
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Uses the write lock because SSTableReader::get() moves the file
    /// position.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut sstables = self.sstables.write();

        for reader in sstables.iter_mut() {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(value) = reader.get(key)? {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    /// Smallest entry across all SSTables whose key satisfies `lower`
    ///
    /// When several SSTables hold that key, the newest one's value wins.
    pub fn first_from(&self, lower: Bound<&[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut sstables = self.sstables.write();

        let mut best: Option<(usize, Vec<u8>)> = None;
        for (i, reader) in sstables.iter().enumerate() {
            if let Some(key) = reader.first_key_from(lower) {
                let smaller = match &best {
                    Some((_, current)) => key < current.as_slice(),
                    None => true,
                };
                if smaller {
                    best = Some((i, key.to_vec()));
                }
            }
        }

        let Some((i, key)) = best else {
            return Ok(None);
        };
        let value = sstables[i].get(&key)?.ok_or_else(|| {
            SigninError::Storage(format!(
                "Indexed key {:?} missing from {}",
                String::from_utf8_lossy(&key),
                sstables[i].path().display()
            ))
        })?;

        Ok(Some((key, value)))
    }

    /// Flush a MemTable to a new SSTable
    ///
    /// Creates a new SSTable file from the MemTable's sorted entries,
    /// opens a reader for it, and adds it to the front of the list.
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(SigninError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, value) in memtable.iter() {
            builder.add(&key, &value)?;
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, reader);

        tracing::debug!(
            "Flushed {} entries to {}",
            metadata.entry_count,
            path.display()
        );

        Ok(metadata)
    }

    /// Merge every SSTable into a single new one (newest value wins)
    ///
    /// Returns `None` when there is nothing to merge. Old files are removed
    /// only after the merged table is durable, so a crash in between leaves
    /// a readable (if redundant) set of tables.
    pub fn compact(&self) -> Result<Option<SSTable>> {
        let mut sstables = self.sstables.write();
        if sstables.len() < 2 {
            return Ok(None);
        }

        // Oldest first so newer tables overwrite
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        for reader in sstables.iter_mut().rev() {
            for entry in reader.iter()? {
                let (key, value) = entry?;
                merged.insert(key, value);
            }
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, value) in &merged {
            builder.add(key, value)?;
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path)?;
        let old = std::mem::replace(&mut *sstables, vec![reader]);
        for table in old {
            let old_path = table.path().to_path_buf();
            drop(table);
            fs::remove_file(&old_path)?;
        }

        tracing::info!(
            "Compacted into {} ({} entries)",
            path.display(),
            metadata.entry_count
        );

        Ok(Some(metadata))
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// Parse SSTable ID from filename
    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("sstable_")?;
        id_str.parse().ok()
    }
}
