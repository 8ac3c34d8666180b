//! SSTable Builder
//!
//! Writes sorted key-value entries to a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SigninError};

use super::{SSTable, HEADER_SIZE, MAGIC, VERSION};

/// Builder for creating new SSTables from sorted entries
pub struct SSTableBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of entries written
    entry_count: u64,
    /// Current write position (for index)
    current_offset: u64,
    /// Index: key → file offset of entry
    index: Vec<(Vec<u8>, u64)>,
    /// Track min/max keys for metadata
    min_key: Option<Vec<u8>>,
    max_key: Option<Vec<u8>>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
}

impl SSTableBuilder {
    /// Create a new SSTable builder
    ///
    /// Writes header immediately; call `add()` in strictly increasing key
    /// order, then `finish()` to write index and footer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        // Write header (entry_count placeholder, will be updated in finish)
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE,
            index: Vec::new(),
            min_key: None,
            max_key: None,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a key-value pair (must be called in strictly increasing key order)
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.max_key {
            if key <= last.as_slice() {
                return Err(SigninError::Storage(format!(
                    "SSTable keys out of order: {:?} after {:?}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(last)
                )));
            }
        }

        // Record offset for index
        self.index.push((key.to_vec(), self.current_offset));

        if self.min_key.is_none() {
            self.min_key = Some(key.to_vec());
        }
        self.max_key = Some(key.to_vec());

        // Entry bytes: [key_len(4)][val_len(4)][key][value]
        let key_len_bytes = (key.len() as u32).to_le_bytes();
        let val_len_bytes = (value.len() as u32).to_le_bytes();

        for part in [&key_len_bytes[..], &val_len_bytes[..], key, value] {
            self.writer.write_all(part)?;
            self.data_hasher.update(part);
        }

        self.current_offset += 8 + key.len() as u64 + value.len() as u64;
        self.entry_count += 1;

        Ok(())
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Finish building: write index block, footer, and return metadata
    pub fn finish(mut self) -> Result<SSTable> {
        let index_offset = self.current_offset;

        // Index block: [key_len(4)][offset(8)][key] for each entry
        for (key, offset) in &self.index {
            self.writer.write_all(&(key.len() as u32).to_le_bytes())?;
            self.writer.write_all(&offset.to_le_bytes())?;
            self.writer.write_all(key)?;
        }

        let data_crc = self.data_hasher.finalize();

        // Footer: index_offset (8) + data_crc (4) + padding (4)
        self.writer.write_all(&index_offset.to_le_bytes())?;
        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;

        self.writer.flush()?;

        // Seek back and update entry count in header
        let mut file = self.writer.into_inner().map_err(|e| {
            SigninError::Storage(format!("Failed to flush SSTable: {}", e))
        })?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        Ok(SSTable {
            path: self.path,
            entry_count: self.entry_count,
            min_key: self.min_key.unwrap_or_default(),
            max_key: self.max_key.unwrap_or_default(),
            file_size,
        })
    }
}
