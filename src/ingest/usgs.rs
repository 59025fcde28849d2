//! USGS Earthquake Hazards Program summary feed
//!
//! Normalizes the GeoJSON summary documents published by the USGS
//! (e.g. `all_hour.geojson`) into `NewEvent` records ready for the store.
//!
//! Feed documentation: https://earthquake.usgs.gov/earthquakes/feed/v1.0/geojson.php

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{FeedError, NewEvent};

/// Source tag stamped on every event from this feed.
pub const USGS_SOURCE: &str = "USGS";

// ============================================================================
// Feed Document Structures
// ============================================================================

/// Top-level GeoJSON `FeatureCollection`.
#[derive(Debug, Deserialize)]
pub struct UsgsFeed {
    #[serde(default)]
    pub features: Vec<UsgsFeature>,
}

/// One detection.
#[derive(Debug, Deserialize)]
pub struct UsgsFeature {
    pub id: Option<String>,
    pub properties: UsgsProperties,
    pub geometry: Option<UsgsGeometry>,
}

#[derive(Debug, Deserialize)]
pub struct UsgsProperties {
    pub mag: Option<f64>,
    pub place: Option<String>,
    /// Origin time, epoch milliseconds.
    pub time: Option<i64>,
    pub url: Option<String>,
    /// 1 when a tsunami flag was raised, else 0.
    pub tsunami: Option<i64>,
    /// Count of "Did You Feel It?" reports.
    pub felt: Option<u32>,
    /// Comma-separated list of every network id for the event,
    /// e.g. `",us7000abcd,at00s1xyz,"`.
    pub ids: Option<String>,
}

/// `[longitude, latitude, depth_km]`
#[derive(Debug, Deserialize)]
pub struct UsgsGeometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Result of normalizing one feed document.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    /// Normalized records, in document order.
    pub events: Vec<NewEvent>,
    /// Features dropped for carrying no magnitude.
    pub skipped: usize,
}

// ============================================================================
// Normalization
// ============================================================================

/// Parse a full feed document.
///
/// A document that is not valid GeoJSON is an error. Individual features
/// without a magnitude are skipped and counted rather than failing the whole
/// document.
pub fn parse_feed(json: &str) -> Result<ParsedFeed, FeedError> {
    let feed: UsgsFeed = serde_json::from_str(json)?;

    let mut parsed = ParsedFeed::default();
    for feature in feed.features {
        match normalize_feature(feature) {
            Ok(event) => parsed.events.push(event),
            Err(FeedError::MissingMagnitude(_)) => parsed.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(parsed)
}

/// Convert a single feature into a `NewEvent`.
///
/// Missing coordinates default to `0.0`; a missing magnitude is rejected.
pub fn normalize_feature(feature: UsgsFeature) -> Result<NewEvent, FeedError> {
    let props = feature.properties;

    let external_id = props
        .ids
        .filter(|ids| !ids.trim_matches(',').is_empty())
        .or(feature.id);

    let magnitude = props.mag.ok_or_else(|| {
        FeedError::MissingMagnitude(external_id.clone().unwrap_or_else(|| "<no id>".to_string()))
    })?;

    let coords = feature.geometry.map(|g| g.coordinates).unwrap_or_default();
    let coord = |i: usize| coords.get(i).copied();

    Ok(NewEvent {
        external_id,
        magnitude,
        latitude: coord(1).unwrap_or(0.0),
        longitude: coord(0).unwrap_or(0.0),
        depth_km: coord(2),
        place: props.place,
        source: USGS_SOURCE.to_string(),
        url: props.url,
        tsunami: props.tsunami.unwrap_or(0) != 0,
        felt_reports: props.felt,
        reported_at: props.time.and_then(DateTime::<Utc>::from_timestamp_millis),
    })
}

// ============================================================================
// Tests
// ============================================================================
