//! Magnitude trend classification.
//!
//! A cluster's recent magnitudes are compared against a baseline taken from
//! the store's overall history, not from the cluster itself: the baseline is
//! the average of history positions 5 through 9 (newest first). With fewer
//! than six events retained that slice is empty and the baseline is 0, so
//! any cluster of positive magnitudes above 0.3 reads as increasing.

use crate::model::{Event, Trend};

/// Minimum difference between recent and baseline averages for a trend.
pub const TREND_DELTA: f64 = 0.3;

/// Number of most recent cluster members averaged.
const RECENT_MEMBERS: usize = 5;

/// History positions `[start, end)` forming the baseline.
const BASELINE_START: usize = 5;
const BASELINE_END: usize = 10;

/// Classifies the magnitude trend of `members` against `history`
/// (the store's full retained history, newest first).
///
/// Fewer than two members is always `Stable`.
pub fn magnitude_trend<'a, I>(members: &[&Event], history: I) -> Trend
where
    I: IntoIterator<Item = &'a Event>,
{
    if members.len() < 2 {
        return Trend::Stable;
    }

    let mut by_recency: Vec<&Event> = members.to_vec();
    by_recency.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));
    let recent = &by_recency[..by_recency.len().min(RECENT_MEMBERS)];
    let recent_avg = recent.iter().map(|e| e.magnitude).sum::<f64>() / recent.len() as f64;

    let baseline_avg = baseline_average(history);

    if recent_avg > baseline_avg + TREND_DELTA {
        Trend::Increasing
    } else if recent_avg < baseline_avg - TREND_DELTA {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Average magnitude over history positions 5..10, or 0 when the slice is
/// empty.
fn baseline_average<'a, I>(history: I) -> f64
where
    I: IntoIterator<Item = &'a Event>,
{
    let (sum, count) = history
        .into_iter()
        .skip(BASELINE_START)
        .take(BASELINE_END - BASELINE_START)
        .fold((0.0, 0usize), |(sum, count), e| (sum + e.magnitude, count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
