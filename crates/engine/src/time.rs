use chrono::{DateTime, TimeZone, Utc};

/// Converts a millisecond epoch timestamp to a UTC datetime. Out-of-range
/// values fall back to the epoch instead of panicking.
pub fn utc_time(timestamp_ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_default()
}
