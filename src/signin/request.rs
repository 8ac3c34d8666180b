//! Request validation
//!
//! Raw string parameters pass through small stage functions, in a fixed
//! order per request kind. Each stage either yields a typed value or a
//! typed input error; a request reaches the service only as a fully
//! validated query struct.

use super::date_key::{year_range, DateKey};
use super::location::{LocationRegistry, DEFAULT_LOCATION_CODE};
use super::record::DailyRecord;
use crate::error::{Result, SigninError};

// =============================================================================
// Stages
// =============================================================================

/// `date` parameter: loose `Y-M-D`, padded to a key
pub fn date_stage(raw: &str) -> Result<DateKey> {
    if raw.is_empty() {
        return Err(SigninError::MissingParam("date"));
    }
    DateKey::parse_loose(raw)
}

/// `day` parameter: exact `YYYY-MM-DD`
pub fn day_stage(raw: &str) -> Result<DateKey> {
    if raw.is_empty() {
        return Err(SigninError::MissingParam("day"));
    }
    DateKey::parse_strict(raw)
}

/// `year` parameter: an integer inside the supported range
pub fn year_stage(raw: &str) -> Result<i32> {
    if raw.is_empty() {
        return Err(SigninError::MissingParam("year"));
    }
    let year: i32 = raw
        .parse()
        .map_err(|_| SigninError::InvalidYear(format!("{:?} is not a year", raw)))?;
    year_range(year)?;
    Ok(year)
}

/// `loc` parameter: resolved to a bucket; empty means `default` if given
pub fn location_stage(
    registry: &LocationRegistry,
    raw: &str,
    default: Option<&str>,
) -> Result<String> {
    let code = match (raw.is_empty(), default) {
        (false, _) => raw,
        (true, Some(code)) => code,
        (true, None) => return Err(SigninError::MissingParam("loc")),
    };
    registry.resolve(code).map(str::to_string)
}

/// Request body: a client-submitted record
pub fn body_stage(raw: &[u8]) -> Result<DailyRecord> {
    if raw.is_empty() {
        return Err(SigninError::MissingParam("body"));
    }
    DailyRecord::from_input(raw)
}

// =============================================================================
// Validated queries
// =============================================================================

/// One day's record at one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyQuery {
    pub bucket: String,
    pub date: DateKey,
}

impl DailyQuery {
    /// date → location (defaulting to the main location)
    pub fn validate(registry: &LocationRegistry, loc: &str, date: &str) -> Result<Self> {
        let date = date_stage(date)?;
        let bucket = location_stage(registry, loc, Some(DEFAULT_LOCATION_CODE))?;
        Ok(Self { bucket, date })
    }
}

/// A record to store for one day at one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutQuery {
    pub target: DailyQuery,
    pub record: DailyRecord,
}

impl PutQuery {
    /// date → location → body
    pub fn validate(registry: &LocationRegistry, loc: &str, date: &str, body: &[u8]) -> Result<Self> {
        let target = DailyQuery::validate(registry, loc, date)?;
        let record = body_stage(body)?;
        Ok(Self { target, record })
    }
}

/// A year at one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearQuery {
    pub bucket: String,
    pub year: i32,
}

impl YearQuery {
    /// year → location
    pub fn validate(registry: &LocationRegistry, loc: &str, year: &str) -> Result<Self> {
        let year = year_stage(year)?;
        let bucket = location_stage(registry, loc, None)?;
        Ok(Self { bucket, year })
    }
}

/// The week around a day at one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekQuery {
    pub bucket: String,
    pub day: DateKey,
}

impl WeekQuery {
    /// day → location
    pub fn validate(registry: &LocationRegistry, loc: &str, day: &str) -> Result<Self> {
        let day = day_stage(day)?;
        let bucket = location_stage(registry, loc, None)?;
        Ok(Self { bucket, day })
    }
}

/// A whole location bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketQuery {
    pub bucket: String,
}

impl BucketQuery {
    pub fn validate(registry: &LocationRegistry, loc: &str) -> Result<Self> {
        let bucket = location_stage(registry, loc, None)?;
        Ok(Self { bucket })
    }
}

/// Keys of a location bucket sharing a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixQuery {
    pub bucket: String,
    pub prefix: String,
}

impl PrefixQuery {
    /// An empty prefix matches every key
    pub fn validate(registry: &LocationRegistry, loc: &str, prefix: &str) -> Result<Self> {
        let bucket = location_stage(registry, loc, None)?;
        Ok(Self {
            bucket,
            prefix: prefix.to_string(),
        })
    }
}
