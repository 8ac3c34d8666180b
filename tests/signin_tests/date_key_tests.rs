//! Date key tests
//!
//! Tests verify:
//! - Canonical key normalization and rejection of bad dates
//! - Year key ranges
//! - Week windows around a day

use chrono::NaiveDate;
use signlog::signin::{canonical_key, week_window, year_range, DateKey, MAX_YEAR, MIN_YEAR};
use signlog::SigninError;

#[test]
fn test_canonical_key_pads_month_and_day() {
    assert_eq!(canonical_key("2017", "6", "21").unwrap(), "2017-06-21");
    assert_eq!(canonical_key("2017", "06", "1").unwrap(), "2017-06-01");
    assert_eq!(canonical_key("2017", "12", "31").unwrap(), "2017-12-31");
}

#[test]
fn test_canonical_key_parses_back_to_same_date() {
    let mut date = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
    while date < end {
        let key = canonical_key(
            &date.format("%Y").to_string(),
            &date.format("%-m").to_string(),
            &date.format("%-d").to_string(),
        )
        .unwrap();
        assert_eq!(NaiveDate::parse_from_str(&key, "%Y-%m-%d").unwrap(), date);
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn test_canonical_key_rejects_invalid_dates() {
    for (y, m, d) in [
        ("2017", "2", "30"),
        ("2017", "13", "1"),
        ("2017", "0", "10"),
        ("17", "6", "21"),
        ("2017", "123", "1"),
        ("2017", "6", ""),
        ("2017", "a", "1"),
    ] {
        assert!(
            matches!(canonical_key(y, m, d), Err(SigninError::InvalidDate(_))),
            "{}-{}-{} should be rejected",
            y,
            m,
            d
        );
    }
}

#[test]
fn test_parse_loose_requires_three_tokens() {
    assert_eq!(DateKey::parse_loose("2017-6-21").unwrap().key(), "2017-06-21");
    assert!(matches!(DateKey::parse_loose("2017-06"), Err(SigninError::InvalidDate(_))));
    assert!(matches!(DateKey::parse_loose("2017-06-21-1"), Err(SigninError::InvalidDate(_))));
    assert!(matches!(DateKey::parse_loose(""), Err(SigninError::InvalidDate(_))));
}

#[test]
fn test_parse_strict_requires_padding() {
    assert_eq!(DateKey::parse_strict("2017-09-01").unwrap().to_string(), "2017-09-01");
    assert!(DateKey::parse_strict("2017-9-1").is_err());
    assert!(DateKey::parse_strict("2017-02-29").is_err());
    assert!(DateKey::parse_strict("2017/09/01").is_err());
}

#[test]
fn test_year_range() {
    assert_eq!(
        year_range(2017).unwrap(),
        ("2017-01-01".to_string(), "2018-01-01".to_string())
    );

    let (min, max) = year_range(2017).unwrap();
    assert!("2017-12-31" >= min.as_str() && "2017-12-31" < max.as_str());
    assert!("2018-01-01" >= max.as_str());
}

#[test]
fn test_year_range_bounds() {
    assert!(year_range(MIN_YEAR).is_ok());
    assert!(year_range(MAX_YEAR).is_ok());
    assert!(matches!(year_range(MIN_YEAR - 1), Err(SigninError::InvalidYear(_))));
    assert!(matches!(year_range(MAX_YEAR + 1), Err(SigninError::InvalidYear(_))));
}

#[test]
fn test_week_window_for_a_friday() {
    assert_eq!(
        week_window("2017-09-01").unwrap(),
        vec![
            "2017-08-28",
            "2017-08-29",
            "2017-08-30",
            "2017-08-31",
            "2017-09-01",
            "2017-09-02",
            "2017-09-03",
        ]
    );
}

#[test]
fn test_week_window_edges() {
    // Monday starts its own window, Sunday ends it
    let monday = week_window("2017-08-28").unwrap();
    let sunday = week_window("2017-09-03").unwrap();
    assert_eq!(monday, sunday);
    assert_eq!(monday[0], "2017-08-28");

    // Windows cross month and year boundaries
    assert_eq!(
        week_window("2018-01-01").unwrap(),
        vec![
            "2018-01-01",
            "2018-01-02",
            "2018-01-03",
            "2018-01-04",
            "2018-01-05",
            "2018-01-06",
            "2018-01-07",
        ]
    );
    assert_eq!(week_window("2017-12-31").unwrap()[0], "2017-12-25");
}

#[test]
fn test_week_window_rejects_bad_day() {
    assert!(matches!(week_window("2017-9-1"), Err(SigninError::InvalidDate(_))));
    assert!(matches!(week_window("yesterday"), Err(SigninError::InvalidDate(_))));
}

#[test]
fn test_keys_sort_like_dates() {
    let mut keys: Vec<String> = ["2017-10-02", "2017-9-30", "2016-12-31", "2017-1-1"]
        .iter()
        .map(|s| DateKey::parse_loose(s).unwrap().key())
        .collect();
    keys.sort();

    assert_eq!(keys, vec!["2016-12-31", "2017-01-01", "2017-09-30", "2017-10-02"]);
}
