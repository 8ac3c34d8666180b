//! # signlog
//!
//! A daily sign-in log service over an embedded key-value store:
//! - Bucketed, ordered key space (one bucket per location)
//! - Write-Ahead Logging (WAL) for durability
//! - Date-keyed records with range-scan aggregation (year, week)
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │        SigninService (validate → query → aggregate)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  view / update transactions
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Engine (buckets)                           │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;
pub mod signin;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SigninError, Result};
pub use config::Config;
pub use engine::Engine;
pub use signin::{DailyRecord, SigninService, YearStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of signlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
