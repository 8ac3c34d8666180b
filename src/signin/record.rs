//! Daily records and the derived year statistics

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigninError};

/// Tag substring marking a newcomer's first visit
pub const NEWCOMER_MARKER: &str = "新人";

/// `cup_size` value of a record that never had one
pub const UNSET_CUP_SIZE: i64 = -1;

fn unset_cup_size() -> i64 {
    UNSET_CUP_SIZE
}

/// One day's sign-in sheet for one location
///
/// Stored as JSON under its date key; a write replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Who signed in, in sheet order
    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub comment: String,

    #[serde(default = "unset_cup_size")]
    pub cup_size: i64,
}

/// Client-supplied record: `names` and `tags` must be present
#[derive(Deserialize)]
struct RecordInput {
    names: Vec<String>,
    tags: Vec<String>,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    cup_size: i64,
}

impl Default for DailyRecord {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            tags: Vec::new(),
            comment: String::new(),
            cup_size: UNSET_CUP_SIZE,
        }
    }
}

impl DailyRecord {
    /// Decode stored bytes
    ///
    /// Returns `None` for bytes that are not a record, leaving the caller to
    /// decide between skipping the entry and substituting a default.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    /// Encode for storage
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SigninError::Serialization(e.to_string()))
    }

    /// Parse a record submitted by a client
    ///
    /// Unlike `decode`, missing `names`/`tags` are rejected and an omitted
    /// `cup_size` means zero cups.
    pub fn from_input(json: &[u8]) -> Result<Self> {
        let input: RecordInput = serde_json::from_slice(json)
            .map_err(|e| SigninError::InvalidRecord(e.to_string()))?;
        Ok(Self {
            names: input.names,
            tags: input.tags,
            comment: input.comment,
            cup_size: input.cup_size,
        })
    }

    /// Number of tags carrying the newcomer marker
    pub fn newcomer_tags(&self) -> usize {
        count_newcomers(&self.tags)
    }
}

fn count_newcomers(tags: &[String]) -> usize {
    tags.iter().filter(|tag| tag.contains(NEWCOMER_MARKER)).count()
}

/// The parts of a stored record that year totals read
///
/// A record stored without `cup_size` adds zero cups; stored values,
/// negative ones included, are summed as they are.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordTally {
    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub cup_size: i64,
}

impl RecordTally {
    pub(crate) fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    pub(crate) fn newcomer_tags(&self) -> usize {
        count_newcomers(&self.tags)
    }
}

/// Totals over one year of a location's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStats {
    /// Sum of stored cup sizes; records without one add zero
    pub cup_size: i64,

    /// Total sign-ins (sum of names per day)
    pub num_of_time: u64,

    /// Distinct names
    pub num_of_people: u64,

    /// Newcomer tag occurrences, not deduplicated by person
    pub num_of_new: u64,
}
