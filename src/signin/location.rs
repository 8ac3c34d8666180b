//! Location codes
//!
//! Clients name a location by a short code; each code owns one bucket.

use std::collections::BTreeMap;

use crate::engine::Engine;
use crate::error::{Result, SigninError};

/// Code assumed by daily-log requests that name no location
pub const DEFAULT_LOCATION_CODE: &str = "11";

/// Immutable code → bucket table, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRegistry {
    buckets: BTreeMap<String, String>,
}

impl LocationRegistry {
    /// Build from `(code, bucket)` pairs
    pub fn new<I, C, B>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, B)>,
        C: Into<String>,
        B: Into<String>,
    {
        let mut buckets = BTreeMap::new();
        for (code, bucket) in pairs {
            let (code, bucket) = (code.into(), bucket.into());
            if code.is_empty() {
                return Err(SigninError::Config("empty location code".to_string()));
            }
            if bucket.is_empty() || bucket.contains('\0') {
                return Err(SigninError::Config(format!(
                    "invalid bucket name {:?} for location {}",
                    bucket, code
                )));
            }
            if buckets.insert(code.clone(), bucket).is_some() {
                return Err(SigninError::Config(format!("duplicate location code {}", code)));
            }
        }
        if buckets.is_empty() {
            return Err(SigninError::Config("no locations configured".to_string()));
        }
        Ok(Self { buckets })
    }

    /// Parse `CODE=BUCKET` specs, as given on the command line
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let pairs = specs
            .iter()
            .map(|spec| {
                let spec = spec.as_ref();
                spec.split_once('=')
                    .map(|(code, bucket)| (code.trim().to_string(), bucket.trim().to_string()))
                    .ok_or_else(|| {
                        SigninError::Config(format!("location {:?} is not CODE=BUCKET", spec))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(pairs)
    }

    /// Bucket for a location code
    pub fn resolve(&self, code: &str) -> Result<&str> {
        self.buckets
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| SigninError::UnknownLocation(code.to_string()))
    }

    /// Every configured bucket name
    pub fn buckets(&self) -> impl Iterator<Item = &str> {
        self.buckets.values().map(String::as_str)
    }

    /// `(code, bucket)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buckets.iter().map(|(c, b)| (c.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Create the bucket of every location, in one transaction
    pub fn ensure_buckets(&self, engine: &Engine) -> Result<usize> {
        engine.update(|tx| {
            let mut created = 0;
            for bucket in self.buckets() {
                if tx.create_bucket_if_not_exists(bucket)? {
                    created += 1;
                }
            }
            Ok(created)
        })
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        let buckets = [("0", "test"), (DEFAULT_LOCATION_CODE, "tianjin_nankai")]
            .into_iter()
            .map(|(code, bucket)| (code.to_string(), bucket.to_string()))
            .collect();
        Self { buckets }
    }
}
