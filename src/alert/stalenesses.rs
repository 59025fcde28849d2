//! Feed staleness detection.
//!
//! The upstream feed is polled about once a minute. If nothing has updated
//! the store's feed status for longer than the configured threshold, the
//! poller is likely wedged even though the status still reads ACTIVE. This
//! module lets the alerting layer flag that gap.
//!
//! # Clock injection
//! All functions accept a `now: DateTime<Utc>` parameter rather than calling
//! `Utc::now()` internally, so staleness is deterministic in tests.

use chrono::{DateTime, Duration, Utc};

use crate::model::Stats;

/// Returns `true` if the feed's last update is older than `max_age_minutes`
/// relative to `now`.
///
/// Staleness is strictly greater than the threshold, compared at full
/// precision:
///   age > max_age_minutes  →  stale (5 min 1 s is stale under 5)
///   age == max_age_minutes →  not stale
///
/// A store that has never been updated is stale. A threshold too large for
/// chrono never expires.
pub fn is_feed_stale_at(stats: &Stats, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
    let Some(updated) = stats.last_updated else {
        return true;
    };
    match i64::try_from(max_age_minutes).ok().and_then(Duration::try_minutes) {
        Some(max_age) => now - updated > max_age,
        None => false,
    }
}

/// Convenience wrapper that uses the real current time.
/// Use `is_feed_stale_at` in tests to keep them deterministic.
pub fn is_feed_stale(stats: &Stats, max_age_minutes: u64) -> bool {
    is_feed_stale_at(stats, max_age_minutes, Utc::now())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
