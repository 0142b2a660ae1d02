// src/utils/time.rs

//! Timestamp normalization.
//!
//! Feed timestamps arrive in many dialects (RFC 822, ISO 8601 with or
//! without offsets, bare dates). They are all rendered as
//! `YYYY-MM-DD HH:MM` in the fixed UTC+8 zone the corpus is published in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

/// Canonical article timestamp format.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Substituted for articles without a usable timestamp before sorting.
pub const DEFAULT_CREATED: &str = "2024-01-01 00:00";

const PUBLISH_OFFSET_HOURS: i64 = 8;

/// Formats that carry their own UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Formats without an offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S GMT",
    "%a, %d %b %Y %H:%M:%S UTC",
    "%a, %d %b %Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y"];

/// Normalize a raw timestamp to the canonical format.
///
/// Returns an empty string when nothing matches; callers decide on a
/// fallback and log the offending entry.
pub fn normalize_timestamp(raw: &str) -> String {
    parse_timestamp(raw).map(to_canonical).unwrap_or_default()
}

/// Parse a raw timestamp into UTC.
///
/// Text already in the canonical format is read back in the publish zone,
/// so normalizing a normalized value is a no-op.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(local) = NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT) {
        return Some(from_publish_zone(local));
    }

    // General-purpose parsers first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Render a UTC instant in the publish zone, canonical format.
pub fn to_canonical(dt: DateTime<Utc>) -> String {
    to_publish_zone(dt).format(CANONICAL_FORMAT).to_string()
}

/// Current time in the publish zone with second precision, for statistics.
pub fn now_stamp() -> String {
    to_publish_zone(Utc::now())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Sort key for a corpus `created` value; unusable values map to the sentinel.
pub fn sort_key(created: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(created, CANONICAL_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(created).map(to_publish_zone))
        .unwrap_or_else(default_created)
}

fn default_created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn to_publish_zone(dt: DateTime<Utc>) -> NaiveDateTime {
    dt.naive_utc() + TimeDelta::hours(PUBLISH_OFFSET_HOURS)
}

fn from_publish_zone(local: NaiveDateTime) -> DateTime<Utc> {
    (local - TimeDelta::hours(PUBLISH_OFFSET_HOURS)).and_utc()
}
