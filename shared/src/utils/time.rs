//! Time-related utilities

use crate::types::events::Timestamp;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Get the current system time in nanoseconds since UNIX epoch
pub fn system_time_nanos() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as Timestamp
}

/// Signed difference `later - earlier` in seconds.
pub fn span_secs(earlier: Timestamp, later: Timestamp) -> f64 {
    (later as i128 - earlier as i128) as f64 / NANOS_PER_SEC
}

/// Age of `timestamp` relative to `now`. Future timestamps have age zero.
pub fn age(now: Timestamp, timestamp: Timestamp) -> Duration {
    Duration::from_nanos(now.saturating_sub(timestamp))
}

/// Whole seconds to a nanosecond timestamp.
pub fn secs_to_nanos(secs: u64) -> Timestamp {
    secs.saturating_mul(1_000_000_000)
}
