//! Foreshock probability thresholds.
//!
//! A cluster becomes a forecast alert once its probability passes
//! `ALERT_THRESHOLD`, and a HIGH alert once it passes `HIGH_THRESHOLD`.
//! Both comparisons are strict.

use crate::model::{AlertLevel, ProbabilityBreakdown};

/// Probabilities strictly above this produce an alert.
pub const ALERT_THRESHOLD: u8 = 30;

/// Probabilities strictly above this are HIGH; the rest are MODERATE.
pub const HIGH_THRESHOLD: u8 = 60;

/// Returns the alert tier for a probability, or `None` if it does not pass
/// `ALERT_THRESHOLD`.
pub fn classify_probability(probability: u8) -> Option<AlertLevel> {
    if probability > HIGH_THRESHOLD {
        Some(AlertLevel::High)
    } else if probability > ALERT_THRESHOLD {
        Some(AlertLevel::Moderate)
    } else {
        None
    }
}

/// Counts probabilities per band for inspection reports.
///
/// Unlike `classify_probability`, the moderate band here includes 30
/// itself: exactly 30 is reported as moderate but never alerted on.
pub fn breakdown<I>(probabilities: I) -> ProbabilityBreakdown
where
    I: IntoIterator<Item = u8>,
{
    probabilities
        .into_iter()
        .fold(ProbabilityBreakdown::default(), |mut acc, p| {
            if p > HIGH_THRESHOLD {
                acc.high += 1;
            } else if p >= ALERT_THRESHOLD {
                acc.moderate += 1;
            } else {
                acc.low += 1;
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_probability_boundaries() {
        assert_eq!(classify_probability(0), None);
        assert_eq!(classify_probability(30), None, "30 is not above the alert threshold");
        assert_eq!(classify_probability(31), Some(AlertLevel::Moderate));
        assert_eq!(classify_probability(60), Some(AlertLevel::Moderate));
        assert_eq!(classify_probability(61), Some(AlertLevel::High));
        assert_eq!(classify_probability(100), Some(AlertLevel::High));
    }

    #[test]
    fn test_breakdown_counts_30_as_moderate() {
        let counts = breakdown([10, 29, 30, 45, 60, 61, 99]);
        assert_eq!(counts.low, 2);
        assert_eq!(counts.moderate, 3);
        assert_eq!(counts.high, 2);
    }

    #[test]
    fn test_breakdown_of_nothing_is_all_zero() {
        assert_eq!(breakdown(Vec::new()), ProbabilityBreakdown::default());
    }
}
