//! Sign-in service
//!
//! Owns the engine and the location table, and runs each validated query
//! in exactly one store transaction.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::Command;

use super::aggregate;
use super::location::LocationRegistry;
use super::record::{DailyRecord, YearStats};
use super::request::{BucketQuery, DailyQuery, PrefixQuery, PutQuery, WeekQuery, YearQuery};

/// Result of an executed command, ready to serialize as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Record(DailyRecord),
    Records(Vec<DailyRecord>),
    Stats(YearStats),
    Keys(Vec<String>),
    Entries(BTreeMap<String, String>),
    Message { msg: String },
}

impl Reply {
    pub fn message(msg: impl Into<String>) -> Self {
        Reply::Message { msg: msg.into() }
    }
}

/// The sign-in log over a bucketed store
pub struct SigninService {
    engine: Engine,
    locations: LocationRegistry,
    max_scan_entries: usize,
}

impl SigninService {
    /// Open the store and make sure every location has its bucket
    pub fn open(config: Config) -> Result<Self> {
        Self::new(Engine::open(config)?)
    }

    /// Wrap an open engine, taking locations and limits from its config
    pub fn new(engine: Engine) -> Result<Self> {
        let locations = engine.config().locations.clone();
        let max_scan_entries = engine.config().max_scan_entries;

        let created = locations.ensure_buckets(&engine)?;
        if created > 0 {
            tracing::info!("Created {} location bucket(s)", created);
        }

        Ok(Self {
            engine,
            locations,
            max_scan_entries,
        })
    }

    /// Validate and run a client command
    pub fn execute(&self, command: Command) -> Result<Reply> {
        let registry = &self.locations;
        match command {
            Command::GetLog { loc, date } => {
                let query = DailyQuery::validate(registry, &loc, &date)?;
                self.get_daily(&query).map(Reply::Record)
            }
            Command::PutLog { loc, date, body } => {
                let query = PutQuery::validate(registry, &loc, &date, &body)?;
                self.put_daily(&query)?;
                Ok(Reply::message("OK"))
            }
            Command::Year { loc, year } => {
                let query = YearQuery::validate(registry, &loc, &year)?;
                self.year_stats(&query).map(Reply::Stats)
            }
            Command::Week { loc, day } => {
                let query = WeekQuery::validate(registry, &loc, &day)?;
                self.week_logs(&query).map(Reply::Records)
            }
            Command::Keys { loc } => {
                let query = BucketQuery::validate(registry, &loc)?;
                self.scan_keys(&query).map(Reply::Keys)
            }
            Command::Scan { loc, prefix } => {
                let query = PrefixQuery::validate(registry, &loc, &prefix)?;
                self.scan_prefix(&query).map(Reply::Entries)
            }
            Command::Ping => Ok(Reply::message("PONG")),
        }
    }

    /// The stored record, or a default one when the day is empty or its
    /// stored value is unreadable
    pub fn get_daily(&self, query: &DailyQuery) -> Result<DailyRecord> {
        let key = query.date.key();
        let stored = self
            .engine
            .view(|tx| tx.get(&query.bucket, key.as_bytes()))?;

        let Some(bytes) = stored else {
            return Ok(DailyRecord::default());
        };
        match DailyRecord::decode(&bytes) {
            Some(record) => Ok(record),
            None => {
                tracing::warn!("Stored record {}/{} is unreadable", query.bucket, key);
                Ok(DailyRecord::default())
            }
        }
    }

    /// Replace the day's record
    pub fn put_daily(&self, query: &PutQuery) -> Result<()> {
        let key = query.target.date.key();
        let bytes = query.record.encode()?;
        self.engine
            .update(|tx| tx.put(&query.target.bucket, key.as_bytes(), &bytes))
    }

    pub fn year_stats(&self, query: &YearQuery) -> Result<YearStats> {
        self.engine
            .view(|tx| aggregate::year_stats(tx, &query.bucket, query.year))
    }

    pub fn week_logs(&self, query: &WeekQuery) -> Result<Vec<DailyRecord>> {
        self.engine
            .view(|tx| aggregate::week_logs(tx, &query.bucket, &query.day))
    }

    pub fn scan_keys(&self, query: &BucketQuery) -> Result<Vec<String>> {
        let keys = self
            .engine
            .view(|tx| aggregate::scan_all_keys(tx, &query.bucket, self.max_scan_entries))?;
        Ok(keys
            .into_iter()
            .map(|k| String::from_utf8_lossy(&k).into_owned())
            .collect())
    }

    /// Raw stored values by key; values are shown as text, not decoded
    pub fn scan_prefix(&self, query: &PrefixQuery) -> Result<BTreeMap<String, String>> {
        let entries = self.engine.view(|tx| {
            aggregate::scan_prefix(
                tx,
                &query.bucket,
                query.prefix.as_bytes(),
                self.max_scan_entries,
            )
        })?;
        Ok(entries
            .into_iter()
            .map(|(k, v)| {
                (
                    String::from_utf8_lossy(&k).into_owned(),
                    String::from_utf8_lossy(&v).into_owned(),
                )
            })
            .collect())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    /// Flush, compact and close the store
    pub fn close(self) -> Result<()> {
        self.engine.close()
    }
}
