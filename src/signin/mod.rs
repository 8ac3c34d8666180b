//! Sign-in Module
//!
//! The application core: daily records keyed by date inside per-location
//! buckets, and the aggregations computed over them.
//!
//! ## Data Flow
//! ```text
//! raw params ──► request stages ──► typed query ──► SigninService
//!                                                      │
//!                                    view/update ◄─────┘
//!                                         │
//!                     DailyRecord codec ◄─┴─► aggregate (year, week, scans)
//! ```

mod aggregate;
mod date_key;
mod location;
mod record;
mod request;
mod service;

pub use aggregate::{scan_all_keys, scan_prefix, week_logs, year_stats};
pub use date_key::{canonical_key, week_window, year_range, DateKey, MAX_YEAR, MIN_YEAR};
pub use location::{LocationRegistry, DEFAULT_LOCATION_CODE};
pub use record::{DailyRecord, YearStats, NEWCOMER_MARKER, UNSET_CUP_SIZE};
pub use request::{
    body_stage, date_stage, day_stage, location_stage, year_stage, BucketQuery, DailyQuery,
    PrefixQuery, PutQuery, WeekQuery, YearQuery,
};
pub use service::{Reply, SigninService};
