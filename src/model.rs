//! Core data types for the earthquake forecast service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no analysis logic and no I/O, only types and the error enum
//! raised when upstream records cannot be normalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A normalized earthquake detection, as handed over by a feed or a manual
/// submission. Not yet admitted into history.
///
/// Absent coordinates are represented as `0.0` rather than `None`; the
/// clustering pass treats every event as located.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewEvent {
    /// Upstream identifier used for deduplication. `None` or empty means the
    /// record is never deduplicated.
    pub external_id: Option<String>,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: Option<f64>,
    pub place: Option<String>,
    pub source: String,
    pub url: Option<String>,
    #[serde(default)]
    pub tsunami: bool,
    pub felt_reports: Option<u32>,
    /// Origin time reported upstream. Display only; all window math uses the
    /// ingestion instant.
    pub reported_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn new(magnitude: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            magnitude,
            latitude,
            longitude,
            ..Self::default()
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// The identifier to deduplicate on, if any.
    pub fn dedup_key(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// An earthquake admitted into the store's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Sequence id assigned on ingest. Never reused within a process.
    pub id: u64,
    pub external_id: Option<String>,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: Option<f64>,
    pub place: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub tsunami: bool,
    pub felt_reports: Option<u32>,
    pub reported_at: Option<DateTime<Utc>>,
    /// Wall-clock instant the store accepted the event.
    pub ingested_at: DateTime<Utc>,
}

impl Event {
    pub(crate) fn admit(record: NewEvent, id: u64, ingested_at: DateTime<Utc>) -> Self {
        Self {
            id,
            external_id: record.external_id,
            magnitude: record.magnitude,
            latitude: record.latitude,
            longitude: record.longitude,
            depth_km: record.depth_km,
            place: record.place,
            source: record.source,
            url: record.url,
            tsunami: record.tsunami,
            felt_reports: record.felt_reports,
            reported_at: record.reported_at,
            ingested_at,
        }
    }

    pub fn dedup_key(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Aggregate statistics
// ---------------------------------------------------------------------------

/// Health of the upstream feed, not of the history contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataStatus {
    #[default]
    Initializing,
    Active,
    Error,
}

/// Running totals maintained by `store::EventStore`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Stats {
    /// Events accepted since start-up or the last clear.
    pub total_events: u64,
    /// Non-decreasing until a clear.
    pub max_magnitude: f64,
    /// Mean over the retained history, rounded to 2 decimals.
    pub average_magnitude: f64,
    pub last_event_at: Option<DateTime<Utc>>,
    pub data_status: DataStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Running stats combined with point-in-time fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: Stats,
    pub history_len: usize,
    /// Maintained by the broadcast layer and passed through here.
    pub connected_clients: usize,
}

// ---------------------------------------------------------------------------
// Cluster types
// ---------------------------------------------------------------------------

/// Direction of magnitudes within a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Stable => write!(f, "stable"),
            Trend::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// A group of events linked within a spatial radius, produced by one
/// detection pass. Ids are only meaningful within that pass.
///
/// `members` are snapshots of the history entries in the order the pass
/// added them (newest first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub id: usize,
    /// Coordinates of the seed event.
    pub center_lat: f64,
    pub center_lon: f64,
    pub members: Vec<Event>,
    pub member_count: usize,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub avg_magnitude: f64,
    pub trend: Trend,
    /// Heuristic 0 to 100.
    pub foreshock_probability: u8,
    /// Ingestion instant of the oldest member.
    pub created_at: DateTime<Utc>,
    /// Ingestion instant of the newest member, not the time of the
    /// detection pass. Forecast alerts report this as `recent_activity`, so
    /// it does not advance while a cluster is quiet.
    pub last_update: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Forecast types
// ---------------------------------------------------------------------------

/// Severity tier of a forecast alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAlert {
    pub cluster_id: usize,
    pub alert_level: AlertLevel,
    pub probability: u8,
    pub cluster_size: usize,
    pub location: GeoPoint,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub trend: Trend,
    /// Most recent activity in the cluster.
    pub recent_activity: DateTime<Utc>,
    pub forecast_hours: u32,
}

impl ForecastAlert {
    /// Magnitude range rendered as `"3.0 - 4.2"`.
    pub fn magnitude_range_label(&self) -> String {
        format!("{:.1} - {:.1}", self.min_magnitude, self.max_magnitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ForecastSummary {
    pub high_probability_events: usize,
    pub moderate_probability_events: usize,
    /// Highest alert probability, 0 when there are no alerts.
    pub max_probability: u8,
}

/// Result of one forecast pass. Alerts are sorted by probability, highest
/// first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub generated_at: DateTime<Utc>,
    pub window_hours: u32,
    pub total_clusters: usize,
    pub alerts: Vec<ForecastAlert>,
    pub summary: ForecastSummary,
}

// ---------------------------------------------------------------------------
// Inspection reports
// ---------------------------------------------------------------------------

/// Cluster counts per probability band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProbabilityBreakdown {
    /// Probability above 60.
    pub high: usize,
    /// Probability from 30 to 60 inclusive.
    pub moderate: usize,
    /// Probability below 30.
    pub low: usize,
}

/// Every cluster found for an arbitrary window and radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeshockReport {
    pub generated_at: DateTime<Utc>,
    pub time_window_minutes: u64,
    pub spatial_radius_km: f64,
    pub total_clusters: usize,
    pub clusters: Vec<Cluster>,
    pub summary: ProbabilityBreakdown,
}

/// Detail view of a single cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAnalysis {
    pub cluster: Cluster,
    /// Members per 100 km, rounded to 2 decimals.
    pub spatial_density: f64,
    pub time_span_minutes: f64,
    /// Monitoring regions containing the cluster center.
    pub regions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while normalizing upstream records into `NewEvent`s.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed document could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A record carried no magnitude. Rejected before it reaches the store.
    #[error("Missing magnitude for record {0}")]
    MissingMagnitude(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_external_id_is_not_a_dedup_key() {
        let record = NewEvent::new(3.0, 0.0, 0.0).with_external_id("");
        assert_eq!(record.dedup_key(), None);
        assert_eq!(NewEvent::new(3.0, 0.0, 0.0).dedup_key(), None);

        let record = NewEvent::new(3.0, 0.0, 0.0).with_external_id("us7000abcd");
        assert_eq!(record.dedup_key(), Some("us7000abcd"));
    }

    #[test]
    fn test_magnitude_range_label_uses_one_decimal() {
        let alert = ForecastAlert {
            cluster_id: 1,
            alert_level: AlertLevel::High,
            probability: 75,
            cluster_size: 3,
            location: GeoPoint { lat: 35.0, lon: 139.0 },
            min_magnitude: 3.0,
            max_magnitude: 4.24,
            trend: Trend::Increasing,
            recent_activity: Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap(),
            forecast_hours: 24,
        };
        assert_eq!(alert.magnitude_range_label(), "3.0 - 4.2");
    }

    #[test]
    fn test_enums_serialize_to_wire_names() {
        assert_eq!(serde_json::to_string(&Trend::Increasing).unwrap(), "\"increasing\"");
        assert_eq!(serde_json::to_string(&AlertLevel::Moderate).unwrap(), "\"MODERATE\"");
        assert_eq!(
            serde_json::to_string(&DataStatus::Initializing).unwrap(),
            "\"INITIALIZING\""
        );
    }
}
