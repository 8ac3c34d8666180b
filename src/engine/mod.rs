//! Engine Module
//!
//! The bucketed, ordered key-value store that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Expose buckets through read and write transactions
//! - Trigger flushes when MemTable is full
//! - Manage crash recovery on startup

mod cursor;
mod keys;
mod transaction;

use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, SigninError};
use crate::memtable::MemTable;
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};

pub use cursor::{BucketIter, Cursor};
pub use keys::MAX_KEY_SIZE;
pub use transaction::{ReadTx, WriteTx};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Write transactions** (`update`): Serialized by `write_lock`
///   - Only ONE write transaction at a time
///   - Writes are buffered in the transaction and committed as one WAL entry
///   - Commit applies the batch to the MemTable under `commit_lock` (write)
///
/// - **Read transactions** (`view`): Hold `commit_lock` (read)
///   - Any number run concurrently
///   - No commit or flush lands while one is open, so every read inside a
///     transaction sees the same state
///
/// Do not open a `view` from inside another `view` on the same thread: a
/// commit waiting for the lock would block the inner one.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory for all data files (SSTables)
    storage_dir: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Serializes write transactions, flushes and compaction
    write_lock: Mutex<()>,

    /// Shared by read transactions, exclusive while state changes
    commit_lock: RwLock<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load existing SSTables
    /// 3. Recover from WAL if it exists, flush recovered data
    /// 4. Start a fresh WAL
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        // Paths are derived from data_dir, not configurable
        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }
            if recovery.entries_corrupted > 0 {
                tracing::warn!(
                    "{} corrupted WAL entries were skipped during recovery",
                    recovery.entries_corrupted
                );
            }

            for entry in entries {
                for operation in entry.batch {
                    Self::apply(&memtable, operation);
                }
            }

            // Recovered data must be durable before the WAL is restarted
            if !memtable.is_empty() {
                tracing::info!("Flushing {} recovered entries to SSTable", memtable.entry_count());
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        tracing::info!(
            "Engine opened at {} ({} sstables)",
            config.data_dir.display(),
            storage.sstable_count()
        );

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
            commit_lock: RwLock::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Run a read-only transaction
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTx<'_>) -> Result<T>,
    {
        let guard = self.commit_lock.read();
        let tx = ReadTx::new(self, guard);
        f(&tx)
    }

    /// Run a read-write transaction
    ///
    /// Writes made through the transaction are committed atomically when `f`
    /// returns `Ok`, and discarded when it returns `Err`.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTx<'_>) -> Result<T>,
    {
        let guard = self.write_lock.lock().map_err(|e| {
            SigninError::LockPoisoned(format!("Write lock poisoned: {}", e))
        })?;

        let mut tx = WriteTx::new(self);
        let value = f(&mut tx)?;
        let batch = tx.into_batch();

        if !batch.is_empty() {
            self.commit(batch)?;
        }

        drop(guard);
        Ok(value)
    }

    /// Create a bucket in its own transaction; returns true if it was new
    pub fn create_bucket_if_not_exists(&self, name: &str) -> Result<bool> {
        self.update(|tx| tx.create_bucket_if_not_exists(name))
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock().map_err(|e| {
            SigninError::LockPoisoned(format!("Write lock poisoned: {}", e))
        })?;
        let _commit_guard = self.commit_lock.write();

        self.flush_internal()
    }

    /// Flush, then merge all SSTables into one
    pub fn compact(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock().map_err(|e| {
            SigninError::LockPoisoned(format!("Write lock poisoned: {}", e))
        })?;
        let _commit_guard = self.commit_lock.write();

        self.flush_internal()?;
        self.storage.compact()?;
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes pending data, compacts storage and syncs the WAL
    pub fn close(self) -> Result<()> {
        self.compact()?;

        let mut wal = self.wal.lock().map_err(|e| {
            SigninError::LockPoisoned(format!("WAL lock poisoned: {}", e))
        })?;
        wal.sync()?;

        tracing::info!("Engine at {} closed", self.config.data_dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the storage directory path (where SSTables are stored)
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Internals shared with transactions and cursors
    // =========================================================================

    /// Point lookup of an internal key: MemTable first, then SSTables
    pub(crate) fn get_internal(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value));
        }
        self.storage.get(key)
    }

    /// Smallest internal entry satisfying `lower`, merged across MemTable
    /// and SSTables; the MemTable wins on equal keys
    pub(crate) fn first_internal(&self, lower: Bound<&[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let from_memtable = self.memtable.first_from(lower);
        let from_storage = self.storage.first_from(lower)?;

        Ok(match (from_memtable, from_storage) {
            (Some(mem), Some(disk)) => {
                if disk.0 < mem.0 {
                    Some(disk)
                } else {
                    Some(mem)
                }
            }
            (mem, disk) => mem.or(disk),
        })
    }

    /// Make a batch durable, then visible
    fn commit(&self, batch: Vec<Operation>) -> Result<()> {
        {
            let mut wal = self.wal.lock().map_err(|e| {
                SigninError::LockPoisoned(format!("WAL lock poisoned: {}", e))
            })?;
            let lsn = wal.append(batch.clone())?;
            tracing::trace!("Committed {} operation(s) at lsn {}", batch.len(), lsn);
        }

        let _commit_guard = self.commit_lock.write();
        for operation in batch {
            Self::apply(&self.memtable, operation);
        }

        if self.memtable.should_flush(self.config.memtable_size_limit) {
            self.flush_internal()?;
        }

        Ok(())
    }

    /// Internal flush implementation (called with both locks held)
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable)?;
        self.memtable.clear();

        // Entries are now durable in SSTable
        let mut wal = self.wal.lock().map_err(|e| {
            SigninError::LockPoisoned(format!("WAL lock poisoned: {}", e))
        })?;
        wal.truncate()?;

        Ok(())
    }

    fn apply(memtable: &MemTable, operation: Operation) {
        match operation {
            Operation::CreateBucket { name } => {
                memtable.put(keys::catalog_key(&name), Vec::new());
            }
            Operation::Put { bucket, key, value } => {
                memtable.put(keys::data_key(&bucket, &key), value);
            }
        }
    }
}
