//! Internal key layout
//!
//! Buckets share one ordered key space:
//! ```text
//! catalog entry:  0x00 | bucket name            (value empty)
//! data entry:     bucket name | 0x00 | user key
//! ```
//! Bucket names are non-empty and NUL-free, so the two namespaces never
//! collide and each bucket's keys stay contiguous and byte-ordered.

use crate::error::{Result, SigninError};

/// Separator between bucket name and user key
pub(crate) const SEPARATOR: u8 = 0x00;

/// Largest user key accepted
pub const MAX_KEY_SIZE: usize = 32 * 1024;

/// Reject names that would break the key layout
pub(crate) fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() || name.as_bytes().contains(&SEPARATOR) {
        return Err(SigninError::InvalidBucketName(name.to_string()));
    }
    Ok(())
}

/// Reject empty or oversized user keys
pub(crate) fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(SigninError::InvalidKey("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(SigninError::InvalidKey(format!(
            "key of {} bytes exceeds {}",
            key.len(),
            MAX_KEY_SIZE
        )));
    }
    Ok(())
}

pub(crate) fn catalog_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(SEPARATOR);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Prefix shared by every data key of a bucket
pub(crate) fn bucket_prefix(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(name.len() + 1);
    key.extend_from_slice(name.as_bytes());
    key.push(SEPARATOR);
    key
}

pub(crate) fn data_key(name: &str, key: &[u8]) -> Vec<u8> {
    let mut internal = bucket_prefix(name);
    internal.extend_from_slice(key);
    internal
}
