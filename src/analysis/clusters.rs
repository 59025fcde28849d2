//! Spatiotemporal cluster detection.
//!
//! Clusters are recomputed from scratch on every call. Membership is
//! chained: an event joins the first cluster holding *any* member within the
//! radius, so a cluster's footprint can grow past the radius from its seed.
//! Distance is never measured from a centroid.
//!
//! Events without coordinates arrive as (0, 0) and will cluster with each
//! other near the origin.

use chrono::{DateTime, Duration, Utc};

use crate::alert::scoring::foreshock_probability;
use crate::analysis::geo::haversine_km;
use crate::analysis::round2;
use crate::analysis::trend::magnitude_trend;
use crate::logging::{self, Component};
use crate::model::{Cluster, Event};
use crate::store::EventStore;

/// Default lookback for cluster detection: 24 hours.
pub const DEFAULT_WINDOW_MINUTES: u64 = 1440;

/// Default linking radius.
pub const DEFAULT_RADIUS_KM: f64 = 100.0;

/// Clusters smaller than this are never surfaced.
pub const MIN_CLUSTER_MEMBERS: usize = 2;

/// A cluster under construction, borrowing members from the store.
struct Grouping<'a> {
    id: usize,
    center_lat: f64,
    center_lon: f64,
    members: Vec<&'a Event>,
}

impl Grouping<'_> {
    fn links(&self, event: &Event, radius_km: f64) -> bool {
        self.members.iter().any(|m| {
            haversine_km(event.latitude, event.longitude, m.latitude, m.longitude) < radius_km
        })
    }
}

/// Groups events ingested within `window_minutes` of `now` into clusters
/// linked at `radius_km`.
///
/// Returned clusters are in creation order and all have at least
/// `MIN_CLUSTER_MEMBERS` members. Ids count every cluster opened during the
/// pass, including the singletons filtered out, so surfaced ids may skip.
pub fn detect_clusters_at(
    store: &EventStore,
    window_minutes: u64,
    radius_km: f64,
    now: DateTime<Utc>,
) -> Vec<Cluster> {
    // A window too large for chrono is treated as unbounded.
    let window = i64::try_from(window_minutes)
        .ok()
        .and_then(Duration::try_minutes);

    let mut groupings: Vec<Grouping> = Vec::new();

    for event in store.iter() {
        // History is newest first, so the first event outside the window
        // ends the walk.
        if let Some(window) = window {
            if now - event.ingested_at > window {
                break;
            }
        }

        match groupings.iter_mut().find(|g| g.links(event, radius_km)) {
            Some(grouping) => grouping.members.push(event),
            None => {
                let id = groupings.len() + 1;
                groupings.push(Grouping {
                    id,
                    center_lat: event.latitude,
                    center_lon: event.longitude,
                    members: vec![event],
                });
            }
        }
    }

    let opened = groupings.len();
    let clusters: Vec<Cluster> = groupings
        .into_iter()
        .filter(|g| g.members.len() >= MIN_CLUSTER_MEMBERS)
        .map(|g| summarize(g, store))
        .collect();

    logging::debug(
        Component::Detector,
        None,
        &format!(
            "{} clusters surfaced of {} opened (window {} min, radius {} km)",
            clusters.len(),
            opened,
            window_minutes,
            radius_km
        ),
    );

    clusters
}

/// Convenience wrapper that uses the real current time.
pub fn detect_clusters(store: &EventStore, window_minutes: u64, radius_km: f64) -> Vec<Cluster> {
    detect_clusters_at(store, window_minutes, radius_km, Utc::now())
}

/// Computes per-cluster statistics, trend and probability, and takes owned
/// snapshots of the members.
fn summarize(grouping: Grouping<'_>, store: &EventStore) -> Cluster {
    let Grouping {
        id,
        center_lat,
        center_lon,
        members,
    } = grouping;

    let magnitudes = members.iter().map(|m| m.magnitude);
    let min_magnitude = magnitudes.clone().fold(f64::INFINITY, f64::min);
    let max_magnitude = magnitudes.clone().fold(f64::NEG_INFINITY, f64::max);
    let avg_magnitude = round2(magnitudes.sum::<f64>() / members.len() as f64);

    let trend = magnitude_trend(&members, store.iter());

    // Members are non-empty by construction.
    let created_at = members.iter().map(|m| m.ingested_at).min().unwrap_or_default();
    let last_update = members.iter().map(|m| m.ingested_at).max().unwrap_or_default();

    let mut cluster = Cluster {
        id,
        center_lat,
        center_lon,
        member_count: members.len(),
        members: members.into_iter().cloned().collect(),
        min_magnitude,
        max_magnitude,
        avg_magnitude,
        trend,
        foreshock_probability: 0,
        created_at,
        last_update,
    };
    cluster.foreshock_probability = foreshock_probability(&cluster);
    cluster
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
