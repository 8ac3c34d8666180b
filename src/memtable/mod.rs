//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Ordered iteration and seeks for cursors and SSTable creation
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys (required for SSTable generation and range seeks)
//! - Simple and correct first, optimize later

mod table;

pub use table::{MemTable, MemTableIterator};
