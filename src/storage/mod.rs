//! Storage Module
//!
//! Persistent storage layer using SSTable-like format.
//!
//! ## Responsibilities
//! - Persist data to disk in sorted format
//! - Point lookups and ordered seeks for range scans
//! - Compaction of all tables into one
//!
//! ## File Format (V1 - Simple)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬──────────┬──────────────┐ │
//! │ │Magic (4) │Version(2)│ Entry Count  │ │
//! │ └──────────┴──────────┴──────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Data Block                             │
//! │ ┌────────┬────────┬─────┬───────────┐ │
//! │ │KeyLen  │ValLen  │ Key │   Value   │ │
//! │ └────────┴────────┴─────┴───────────┘ │
//! │ ... (repeated for each entry)         │
//! ├────────────────────────────────────────┤
//! │ Footer                                 │
//! │ ┌──────────────────┬─────────────────┐ │
//! │ │ Index Offset     │    CRC32        │ │
//! │ └──────────────────┴─────────────────┘ │
//! └────────────────────────────────────────┘
//! ```

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
pub use manager::StorageManager;
