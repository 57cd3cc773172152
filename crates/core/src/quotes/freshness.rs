//! Cache freshness policy.

use chrono::{Duration, NaiveDateTime};

/// Storage format for cache timestamps.
pub const CACHE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(CACHE_TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, CACHE_TIMESTAMP_FORMAT).ok()
}

/// Decides whether a cached entry may be served.
///
/// No timestamp means never fresh. No `max_age` means any timestamped
/// entry is fresh. An unparsable timestamp is treated as stale rather than
/// an error.
pub fn is_fresh(updated_at: Option<&str>, max_age: Option<Duration>, now: NaiveDateTime) -> bool {
    let Some(raw) = updated_at.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return false;
    };
    let Some(max_age) = max_age else {
        return true;
    };
    let Some(stored) = parse_timestamp(raw) else {
        return false;
    };
    now - stored <= max_age
}
