//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole seconds since the Unix epoch, truncated toward zero.
///
/// Instants before the epoch clamp to `0`.
#[must_use]
pub fn unix_seconds(ts: Timestamp) -> u64 {
    u64::try_from(ts.timestamp()).unwrap_or(0)
}
