//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups and seeks via an
//! in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use crate::error::{Result, SigninError};

use super::iterator::SSTableIterator;
use super::{le_u16, le_u32, le_u64, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
pub struct SSTableReader {
    /// Path of the file (for compaction cleanup)
    path: PathBuf,
    /// File handle for reading entries
    pub(super) file: BufReader<File>,
    /// In-memory index: key → file offset
    index: BTreeMap<Vec<u8>, u64>,
    /// Metadata
    entry_count: u64,
    /// Index block starting offset (for iteration)
    pub(super) index_offset: u64,
    /// CRC32 of the data block, as written by the builder
    data_crc: u32,
}

impl SSTableReader {
    /// Open an SSTable for reading
    ///
    /// Loads the entire index into memory for fast lookups.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(SigninError::Storage(format!(
                "SSTable {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        // Read and validate header
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(SigninError::Storage(format!(
                "Invalid SSTable magic: expected SGLG, got {:?}",
                &header[0..4]
            )));
        }

        let version = le_u16(&header[4..6]);
        if version != VERSION {
            return Err(SigninError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let entry_count = le_u64(&header[6..14]);

        // Read footer to get index offset
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let index_offset = le_u64(&footer[0..8]);
        let data_crc = le_u32(&footer[8..12]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(SigninError::Storage(format!(
                "SSTable {} has invalid index offset {}",
                path.display(),
                index_offset
            )));
        }

        // Index block size = file_size - footer_size - index_offset
        let index_block_size = file_size - FOOTER_SIZE - index_offset;
        let mut index_data = vec![0u8; index_block_size as usize];
        file.seek(SeekFrom::Start(index_offset))?;
        file.read_exact(&mut index_data)?;

        // Parse index entries: [key_len(4)][offset(8)][key]
        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos + 12 <= index_data.len() {
            let key_len = le_u32(&index_data[pos..]) as usize;
            let offset = le_u64(&index_data[pos + 4..]);
            pos += 12;

            if pos + key_len > index_data.len() {
                break;
            }
            index.insert(index_data[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }

        if index.len() as u64 != entry_count {
            return Err(SigninError::Storage(format!(
                "SSTable {} index holds {} keys, header says {}",
                path.display(),
                index.len(),
                entry_count
            )));
        }

        file.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: BufReader::new(file),
            index,
            entry_count,
            index_offset,
            data_crc,
        })
    }

    /// Get a value by key — O(log n) lookup via in-memory index
    ///
    /// Returns `Ok(None)` when the key is not in this SSTable.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Ok(None),
        };

        self.file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; 8];
        self.file.read_exact(&mut header)?;

        let key_len = le_u32(&header[0..4]);
        let val_len = le_u32(&header[4..8]) as usize;

        // Skip the key (we already know it matches)
        self.file.seek(SeekFrom::Current(key_len as i64))?;

        let mut value = vec![0u8; val_len];
        self.file.read_exact(&mut value)?;

        Ok(Some(value))
    }

    /// Smallest key in this SSTable satisfying the lower bound
    pub fn first_key_from(&self, lower: Bound<&[u8]>) -> Option<&[u8]> {
        self.index
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, _)| k.as_slice())
    }

    /// Recompute the data block CRC and compare it to the footer
    pub fn verify_checksum(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut remaining = self.index_offset - HEADER_SIZE;
        let mut hasher = crc32fast::Hasher::new();
        let mut buf = [0u8; 8192];

        while remaining > 0 {
            let chunk = remaining.min(buf.len() as u64) as usize;
            self.file.read_exact(&mut buf[..chunk])?;
            hasher.update(&buf[..chunk]);
            remaining -= chunk as u64;
        }

        let actual = hasher.finalize();
        if actual != self.data_crc {
            return Err(SigninError::Storage(format!(
                "SSTable {} data CRC mismatch: stored {:#010x}, computed {:#010x}",
                self.path.display(),
                self.data_crc,
                actual
            )));
        }
        Ok(())
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the minimum key in this SSTable (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    /// Get the maximum key in this SSTable (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Quick check if a key might be in this SSTable (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false, // Empty SSTable
        }
    }

    /// Create an iterator over all entries (for compaction, debugging)
    pub fn iter(&mut self) -> Result<SSTableIterator<'_>> {
        SSTableIterator::new(&mut self.file, self.index_offset)
    }
}
