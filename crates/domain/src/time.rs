//! Time and timestamp helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// UTC timestamp used for last-update bookkeeping, command submission, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether at least `threshold` has passed between `since` and `now`.
///
/// A missing `since` counts as elapsed. A `since` in the future does not.
#[must_use]
pub fn has_elapsed(since: Option<Timestamp>, now: Timestamp, threshold: Duration) -> bool {
    match since {
        None => true,
        Some(since) => (now - since)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= threshold),
    }
}
