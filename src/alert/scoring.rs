//! Foreshock probability scoring.
//!
//! A cluster's probability is the sum of five independently capped
//! contributions, rounded and clamped to 0 to 100:
//!
//! | factor             | rule                                         | max |
//! |--------------------|----------------------------------------------|-----|
//! | size               | `min(members / 10, 1) × 25`                  | 25  |
//! | trend              | increasing 30, stable 15, decreasing 5       | 30  |
//! | magnitude range    | `min((max − min) / 2, 1) × 20`               | 20  |
//! | time concentration | mean gap < 1 h: 25, < 24 h: 15, otherwise 5  | 25  |
//! | peak magnitude     | `min(max / 7, 1) × 20`                       | 20  |

use chrono::Duration;

use crate::model::{Cluster, Event, Trend};

/// Probability of a main shock following `cluster`, 0 to 100.
pub fn foreshock_probability(cluster: &Cluster) -> u8 {
    let total = size_score(cluster.member_count)
        + trend_score(cluster.trend)
        + range_score(cluster.min_magnitude, cluster.max_magnitude)
        + time_concentration_score(&cluster.members)
        + peak_magnitude_score(cluster.max_magnitude);

    // NaN (from NaN magnitudes) saturates to 0 in the cast.
    total.round().clamp(0.0, 100.0) as u8
}

pub fn size_score(member_count: usize) -> f64 {
    (member_count as f64 / 10.0).min(1.0) * 25.0
}

pub fn trend_score(trend: Trend) -> f64 {
    match trend {
        Trend::Increasing => 30.0,
        Trend::Stable => 15.0,
        Trend::Decreasing => 5.0,
    }
}

pub fn range_score(min_magnitude: f64, max_magnitude: f64) -> f64 {
    ((max_magnitude - min_magnitude) / 2.0).min(1.0) * 20.0
}

/// Scores the mean gap between consecutive members, taken in stored order
/// (newest first) without re-sorting. Fewer than two members yields no gap
/// and scores 5.
pub fn time_concentration_score(members: &[Event]) -> f64 {
    if members.len() < 2 {
        return 5.0;
    }

    let total_ms: i64 = members
        .windows(2)
        .map(|pair| (pair[0].ingested_at - pair[1].ingested_at).num_milliseconds())
        .sum();
    let mean_ms = total_ms as f64 / (members.len() - 1) as f64;

    if mean_ms < Duration::hours(1).num_milliseconds() as f64 {
        25.0
    } else if mean_ms < Duration::hours(24).num_milliseconds() as f64 {
        15.0
    } else {
        5.0
    }
}

pub fn peak_magnitude_score(max_magnitude: f64) -> f64 {
    (max_magnitude / 7.0).min(1.0) * 20.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
