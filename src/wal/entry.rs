//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigninError};

/// Header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
///
/// One entry holds every operation of one committed write transaction,
/// so a commit is replayed entirely or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operations committed together
    pub batch: Vec<Operation>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Register a bucket
    CreateBucket { name: String },

    /// Put a key-value pair into a bucket
    Put { bucket: String, key: Vec<u8>, value: Vec<u8> },
}

impl WalEntry {
    /// Create a new entry stamped with the current time
    pub fn new(lsn: u64, batch: Vec<Operation>) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self { lsn, batch, timestamp }
    }

    /// Serialize to the on-disk format: header + bincode data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = self.encode_data()?;
        let len = data.len() as u32;
        let crc = Self::checksum(self.lsn, len, &data);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Deserialize a complete entry, validating length and checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(SigninError::WalCorruption(format!(
                "Entry header too small: {} bytes",
                bytes.len()
            )));
        }

        let (lsn, crc, len) = Self::parse_header(&bytes[..HEADER_SIZE]);
        let data = bytes.get(HEADER_SIZE..HEADER_SIZE + len as usize).ok_or_else(|| {
            SigninError::WalCorruption(format!(
                "Entry truncated: expected {} data bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            ))
        })?;

        Self::decode_body(lsn, crc, len, data)
    }

    /// Size of the serialized entry in bytes
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(HEADER_SIZE + self.encode_data()?.len())
    }

    /// CRC32 over LSN, length and data
    pub fn compute_crc(&self) -> Result<u32> {
        let data = self.encode_data()?;
        Ok(Self::checksum(self.lsn, data.len() as u32, &data))
    }

    /// Split a header into (lsn, crc, data_len)
    pub(super) fn parse_header(header: &[u8]) -> (u64, u32, u32) {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&header[0..8]);
        crc.copy_from_slice(&header[8..12]);
        len.copy_from_slice(&header[12..16]);
        (u64::from_le_bytes(lsn), u32::from_le_bytes(crc), u32::from_le_bytes(len))
    }

    /// Validate checksum and decode the data section
    pub(super) fn decode_body(lsn: u64, crc: u32, len: u32, data: &[u8]) -> Result<Self> {
        let actual = Self::checksum(lsn, len, data);
        if actual != crc {
            return Err(SigninError::WalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:#010x}, computed {:#010x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| SigninError::WalCorruption(format!("Undecodable entry: {}", e)))?;

        if entry.lsn != lsn {
            return Err(SigninError::WalCorruption(format!(
                "LSN mismatch: header {}, body {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    fn encode_data(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| SigninError::Serialization(e.to_string()))
    }

    fn checksum(lsn: u64, len: u32, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(&len.to_le_bytes());
        hasher.update(data);
        hasher.finalize()
    }
}
