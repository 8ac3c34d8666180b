//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{Result, SigninError};
use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    /// Path of the log file
    path: PathBuf,

    /// Buffered handle; flushed on every append
    writer: BufWriter<File>,

    /// LSN the next appended entry receives
    next_lsn: u64,

    /// How often appends are fsynced
    sync_strategy: WalSyncStrategy,

    /// Entries appended since the last fsync
    uncommitted: usize,
}

impl WalWriter {
    /// Create a fresh WAL file, discarding any previous content
    ///
    /// Callers recover an existing log with `WalRecovery` before opening it
    /// for writing.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.sync_all()?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            next_lsn: 1,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append one committed batch to the WAL, returning its LSN
    pub fn append(&mut self, batch: Vec<Operation>) -> Result<u64> {
        let lsn = self.next_lsn;
        let entry = WalEntry::new(lsn, batch);
        let bytes = entry.serialize()?;

        self.writer
            .write_all(&bytes)
            .and_then(|_| self.writer.flush())
            .map_err(|e| SigninError::WalWrite(format!("append lsn {}: {}", lsn, e)))?;

        self.next_lsn += 1;
        self.uncommitted += 1;

        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync()?,
            WalSyncStrategy::EveryNEntries { count } => {
                if self.uncommitted >= count {
                    self.sync()?;
                }
            }
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Drop all entries (after their data became durable elsewhere)
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;

        self.next_lsn = 1;
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries appended but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
