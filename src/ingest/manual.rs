//! Manual earthquake submissions
//!
//! Operators and integration tests can push a detection by hand. Only the
//! magnitude is mandatory; everything else has a default.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{FeedError, NewEvent};

/// Source tag stamped on every manually submitted event.
pub const MANUAL_SOURCE: &str = "MANUAL";

/// Place recorded when the submitter gives none.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Body of a manual submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualSubmission {
    pub magnitude: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
}

/// Normalize a submission received at `now`.
///
/// The external id is `manual_<epoch ms>`, so two submissions in the same
/// millisecond collide and the second is deduplicated away.
pub fn normalize_submission_at(
    submission: ManualSubmission,
    now: DateTime<Utc>,
) -> Result<NewEvent, FeedError> {
    let external_id = format!("manual_{}", now.timestamp_millis());
    let magnitude = submission
        .magnitude
        .ok_or_else(|| FeedError::MissingMagnitude(external_id.clone()))?;

    let place = submission
        .location
        .filter(|loc| !loc.is_empty())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    Ok(NewEvent::new(
        magnitude,
        submission.latitude.unwrap_or(0.0),
        submission.longitude.unwrap_or(0.0),
    )
    .with_external_id(external_id)
    .with_place(place)
    .with_source(MANUAL_SOURCE))
}

pub fn normalize_submission(submission: ManualSubmission) -> Result<NewEvent, FeedError> {
    normalize_submission_at(submission, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_full_submission() {
        let submission = ManualSubmission {
            magnitude: Some(5.1),
            latitude: Some(38.3),
            longitude: Some(142.4),
            location: Some("Off the coast of Miyagi".to_string()),
        };
        let record = normalize_submission_at(submission, fixed_now()).unwrap();
        assert_eq!(record.magnitude, 5.1);
        assert_eq!((record.latitude, record.longitude), (38.3, 142.4));
        assert_eq!(record.place.as_deref(), Some("Off the coast of Miyagi"));
        assert_eq!(record.source, "MANUAL");
        assert_eq!(record.external_id.as_deref(), Some("manual_1714568400000"));
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let submission = ManualSubmission {
            magnitude: Some(3.2),
            location: Some(String::new()),
            ..ManualSubmission::default()
        };
        let record = normalize_submission_at(submission, fixed_now()).unwrap();
        assert_eq!((record.latitude, record.longitude), (0.0, 0.0));
        assert_eq!(record.place.as_deref(), Some("Unknown Location"));
    }

    #[test]
    fn test_missing_magnitude_is_rejected() {
        let result = normalize_submission_at(ManualSubmission::default(), fixed_now());
        assert!(
            matches!(result, Err(FeedError::MissingMagnitude(_))),
            "a submission without magnitude must never reach the store"
        );
    }

    #[test]
    fn test_submission_deserializes_from_json() {
        let submission: ManualSubmission =
            serde_json::from_str(r#"{"magnitude": 4.0, "location": "Reno, NV"}"#).unwrap();
        assert_eq!(submission.magnitude, Some(4.0));
        assert_eq!(submission.latitude, None);
    }
}
