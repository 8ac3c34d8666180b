//! Error types for signlog
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SigninError
pub type Result<T> = std::result::Result<T, SigninError>;

/// Unified error type for signlog operations
#[derive(Debug, Error)]
pub enum SigninError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Invalid bucket name: {0:?}")]
    InvalidBucketName(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Scan exceeded {limit} entries")]
    ScanLimitExceeded { limit: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Input Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid year: {0}")]
    InvalidYear(String),

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Missing parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl SigninError {
    /// True for errors caused by bad request input rather than the store.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SigninError::InvalidDate(_)
                | SigninError::InvalidYear(_)
                | SigninError::UnknownLocation(_)
                | SigninError::MissingParam(_)
                | SigninError::InvalidRecord(_)
        )
    }
}
