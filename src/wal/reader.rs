//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, SigninError};
use super::{WalEntry, HEADER_SIZE};

/// Entries larger than this are treated as a damaged length field
const MAX_ENTRY_SIZE: u32 = 64 * 1024 * 1024;

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last fully read frame
    position: u64,

    /// Set once a torn (incomplete) frame is found at the tail
    partial_tail: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            partial_tail: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns:
    /// - `Ok(Some(entry))` — a valid entry
    /// - `Ok(None)` — end of log, or an incomplete frame at the tail
    /// - `Err(WalCorruption)` — a complete frame failed validation; the
    ///   reader has moved past it if its length field was plausible
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.partial_tail {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        let read = self.read_full(&mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            self.partial_tail = true;
            return Ok(None);
        }

        let (lsn, crc, len) = WalEntry::parse_header(&header);
        if len > MAX_ENTRY_SIZE {
            self.partial_tail = true;
            return Err(SigninError::WalCorruption(format!(
                "Implausible entry length {} at offset {}",
                len, self.position
            )));
        }

        let mut data = vec![0u8; len as usize];
        if self.read_full(&mut data)? < data.len() {
            self.partial_tail = true;
            return Ok(None);
        }

        self.position += (HEADER_SIZE + data.len()) as u64;
        WalEntry::decode_body(lsn, crc, len, &data).map(Some)
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator { reader: self, done: false }
    }

    /// Offset just past the last complete frame
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the log ended in an incomplete or unreadable frame
    pub fn hit_partial_tail(&self) -> bool {
        self.partial_tail
    }

    /// Read until `buf` is full or EOF; returns bytes read
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Iterator over WAL entries
///
/// Yields each entry or corruption error; stops after an I/O error or the
/// end of the log.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e @ SigninError::WalCorruption(_)) => Some(Err(e)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
