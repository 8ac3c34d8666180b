//! Date keys
//!
//! Records are stored under `YYYY-MM-DD` keys. With four-digit years the
//! byte order of these keys is calendar order, which is what makes year and
//! week lookups plain range scans.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::{Result, SigninError};

/// Earliest year the service keeps records for
pub const MIN_YEAR: i32 = 2007;

/// Latest year whose successor still has a four-digit key
pub const MAX_YEAR: i32 = 9998;

/// A calendar date used as a store key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse `Y-M-D` where month and day may omit their leading zero
    /// (`2017-6-21`). The year must have four digits.
    pub fn parse_loose(input: &str) -> Result<Self> {
        let tokens: Vec<&str> = input.split('-').collect();
        let [year, month, day] = tokens.as_slice() else {
            return Err(SigninError::InvalidDate(format!(
                "{:?}: expected 3 parts, got {}",
                input,
                tokens.len()
            )));
        };
        canonical_key(year, month, day).and_then(|key| Self::parse_strict(&key))
    }

    /// Parse an exact `YYYY-MM-DD` key
    pub fn parse_strict(input: &str) -> Result<Self> {
        let bytes = input.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !well_formed {
            return Err(SigninError::InvalidDate(format!("{:?}: expected YYYY-MM-DD", input)));
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map(Self)
            .map_err(|e| SigninError::InvalidDate(format!("{:?}: {}", input, e)))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The store key
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The seven days of this date's week, Monday through Sunday
    ///
    /// The week is anchored on the preceding Sunday (a Sunday itself counts
    /// as the end of its week), and the window starts the day after it.
    pub fn week(&self) -> Result<[DateKey; 7]> {
        let since_sunday = match self.0.weekday().num_days_from_sunday() {
            0 => 7,
            n => n,
        };
        let last_sunday = self
            .0
            .checked_sub_days(Days::new(u64::from(since_sunday)))
            .ok_or_else(|| SigninError::InvalidDate(format!("{}: no preceding Sunday", self)))?;

        let mut days = [*self; 7];
        for (offset, slot) in (1u64..).zip(days.iter_mut()) {
            let day = last_sunday
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| SigninError::InvalidDate(format!("{}: week out of range", self)))?;
            *slot = DateKey(day);
        }
        Ok(days)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

/// Build `YYYY-MM-DD` from separate year/month/day tokens
///
/// Single-digit months and days are zero-padded; the result must be a real
/// calendar date.
pub fn canonical_key(year: &str, month: &str, day: &str) -> Result<String> {
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(year, 4, 4) || !digits(month, 1, 2) || !digits(day, 1, 2) {
        return Err(SigninError::InvalidDate(format!("{}-{}-{}", year, month, day)));
    }

    let key = format!("{}-{:0>2}-{:0>2}", year, month, day);
    NaiveDate::parse_from_str(&key, "%Y-%m-%d")
        .map_err(|e| SigninError::InvalidDate(format!("{}: {}", key, e)))?;
    Ok(key)
}

/// Half-open key range `[year-01-01, year+1-01-01)` covering one year
pub fn year_range(year: i32) -> Result<(String, String)> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(SigninError::InvalidYear(format!(
            "{} (must be between {} and {})",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    Ok((format!("{:04}-01-01", year), format!("{:04}-01-01", year + 1)))
}

/// Keys of the seven days in the week containing `day` (a `YYYY-MM-DD` key)
pub fn week_window(day: &str) -> Result<Vec<String>> {
    let days = DateKey::parse_strict(day)?.week()?;
    Ok(days.iter().map(DateKey::key).collect())
}
