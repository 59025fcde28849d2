//! Main-shock forecast built from cluster analysis.
//!
//! `ForecastEngine` is a read-only view over an `EventStore`. Holding it
//! borrows the store immutably, so no ingest or eviction can interleave with
//! a pass. Every call recomputes clusters from scratch; for unchanged store
//! contents and the same `now`, results are identical.

use chrono::{DateTime, Utc};

use crate::alert::thresholds::{breakdown, classify_probability};
use crate::analysis::clusters::{DEFAULT_RADIUS_KM, DEFAULT_WINDOW_MINUTES, detect_clusters_at};
use crate::analysis::round2;
use crate::logging::{self, Component};
use crate::model::{
    AlertLevel, Cluster, ClusterAnalysis, Forecast, ForecastAlert, ForecastSummary,
    ForeshockReport, GeoPoint,
};
use crate::regions::regions_containing;
use crate::store::EventStore;

/// Linking radius used by every forecast, regardless of window.
pub const FORECAST_RADIUS_KM: f64 = 100.0;

/// Forecast window used when a caller does not pick one.
pub const DEFAULT_FORECAST_HOURS: u32 = 24;

#[derive(Debug, Clone, Copy)]
pub struct ForecastEngine<'a> {
    store: &'a EventStore,
}

impl<'a> ForecastEngine<'a> {
    pub fn new(store: &'a EventStore) -> Self {
        Self { store }
    }

    /// Clusters for an arbitrary window and radius, for direct inspection.
    pub fn clusters_at(&self, window_minutes: u64, radius_km: f64, now: DateTime<Utc>) -> Vec<Cluster> {
        detect_clusters_at(self.store, window_minutes, radius_km, now)
    }

    pub fn clusters(&self, window_minutes: u64, radius_km: f64) -> Vec<Cluster> {
        self.clusters_at(window_minutes, radius_km, Utc::now())
    }

    /// Forecast over the last `hours`, at the fixed 100 km radius.
    ///
    /// Alerts are the clusters above 30, tiered HIGH above 60, and sorted by
    /// probability descending. Ties keep cluster creation order.
    pub fn forecast_at(&self, hours: u32, now: DateTime<Utc>) -> Forecast {
        let window_minutes = u64::from(hours) * 60;
        let clusters = self.clusters_at(window_minutes, FORECAST_RADIUS_KM, now);

        let mut alerts: Vec<ForecastAlert> = clusters
            .iter()
            .filter_map(|c| {
                classify_probability(c.foreshock_probability).map(|level| alert_for(c, level, hours))
            })
            .collect();
        alerts.sort_by(|a, b| b.probability.cmp(&a.probability));

        let summary = ForecastSummary {
            high_probability_events: alerts
                .iter()
                .filter(|a| a.alert_level == AlertLevel::High)
                .count(),
            moderate_probability_events: alerts
                .iter()
                .filter(|a| a.alert_level == AlertLevel::Moderate)
                .count(),
            max_probability: alerts.iter().map(|a| a.probability).max().unwrap_or(0),
        };

        logging::debug(
            Component::Forecast,
            None,
            &format!(
                "{}h forecast: {} clusters, {} alerts, max probability {}",
                hours,
                clusters.len(),
                alerts.len(),
                summary.max_probability
            ),
        );

        Forecast {
            generated_at: now,
            window_hours: hours,
            total_clusters: clusters.len(),
            alerts,
            summary,
        }
    }

    pub fn forecast(&self, hours: u32) -> Forecast {
        self.forecast_at(hours, Utc::now())
    }

    /// Every cluster for the given window and radius with per-band counts.
    pub fn foreshock_report_at(
        &self,
        window_minutes: u64,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> ForeshockReport {
        let clusters = self.clusters_at(window_minutes, radius_km, now);
        ForeshockReport {
            generated_at: now,
            time_window_minutes: window_minutes,
            spatial_radius_km: radius_km,
            total_clusters: clusters.len(),
            summary: breakdown(clusters.iter().map(|c| c.foreshock_probability)),
            clusters,
        }
    }

    /// Detail view of cluster `id` from a default 24 h / 100 km pass.
    ///
    /// Ids are assigned per pass, so the id must come from a pass over the
    /// same store contents.
    pub fn cluster_analysis_at(&self, id: usize, now: DateTime<Utc>) -> Option<ClusterAnalysis> {
        let cluster = self
            .clusters_at(DEFAULT_WINDOW_MINUTES, DEFAULT_RADIUS_KM, now)
            .into_iter()
            .find(|c| c.id == id)?;

        let span = cluster.last_update - cluster.created_at;
        let regions = regions_containing(cluster.center_lat, cluster.center_lon)
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();

        Some(ClusterAnalysis {
            spatial_density: round2(cluster.member_count as f64 / 100.0),
            time_span_minutes: span.num_milliseconds() as f64 / 60_000.0,
            regions,
            cluster,
        })
    }
}

fn alert_for(cluster: &Cluster, level: AlertLevel, hours: u32) -> ForecastAlert {
    ForecastAlert {
        cluster_id: cluster.id,
        alert_level: level,
        probability: cluster.foreshock_probability,
        cluster_size: cluster.member_count,
        location: GeoPoint {
            lat: cluster.center_lat,
            lon: cluster.center_lon,
        },
        min_magnitude: cluster.min_magnitude,
        max_magnitude: cluster.max_magnitude,
        trend: cluster.trend,
        recent_activity: cluster.last_update,
        forecast_hours: hours,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewEvent, Trend};
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn ingest(store: &mut EventStore, mag: f64, lat: f64, lon: f64, minutes_ago: i64) {
        store.ingest_at(
            NewEvent::new(mag, lat, lon),
            fixed_now() - Duration::minutes(minutes_ago),
        );
    }

    /// Three rising events near Tokyo within ten minutes.
    fn rising_sequence(store: &mut EventStore) {
        ingest(store, 3.0, 35.60, 139.70, 10);
        ingest(store, 3.5, 35.70, 139.75, 5);
        ingest(store, 4.2, 35.75, 139.80, 0);
    }

    #[test]
    fn test_empty_store_forecast() {
        let store = EventStore::default();
        let forecast = ForecastEngine::new(&store).forecast_at(24, fixed_now());
        assert_eq!(forecast.total_clusters, 0);
        assert!(forecast.alerts.is_empty());
        assert_eq!(forecast.summary, ForecastSummary::default());
        assert_eq!(forecast.window_hours, 24);
        assert_eq!(forecast.generated_at, fixed_now());
    }

    #[test]
    fn test_rising_sequence_produces_one_high_alert() {
        let mut store = EventStore::default();
        rising_sequence(&mut store);

        let forecast = ForecastEngine::new(&store).forecast_at(24, fixed_now());
        assert_eq!(forecast.total_clusters, 1);
        assert_eq!(forecast.alerts.len(), 1);

        let alert = &forecast.alerts[0];
        // 7.5 + 30 + 12 + 25 + 12 = 86.5 → 87
        assert_eq!(alert.probability, 87);
        assert_eq!(alert.alert_level, AlertLevel::High);
        assert_eq!(alert.cluster_size, 3);
        assert_eq!(alert.trend, Trend::Increasing);
        assert_eq!(alert.location, GeoPoint { lat: 35.75, lon: 139.80 });
        assert_eq!(alert.magnitude_range_label(), "3.0 - 4.2");
        assert_eq!(alert.recent_activity, fixed_now());
        assert_eq!(forecast.summary.high_probability_events, 1);
        assert_eq!(forecast.summary.moderate_probability_events, 0);
        assert_eq!(forecast.summary.max_probability, 87);
    }

    #[test]
    fn test_forecast_window_excludes_older_events() {
        let mut store = EventStore::default();
        ingest(&mut store, 3.0, 35.60, 139.70, 180);
        ingest(&mut store, 3.5, 35.70, 139.75, 150);

        let engine = ForecastEngine::new(&store);
        assert_eq!(engine.forecast_at(1, fixed_now()).total_clusters, 0);
        assert_eq!(engine.forecast_at(24, fixed_now()).total_clusters, 1);
    }

    #[test]
    fn test_low_probability_clusters_are_counted_but_not_alerted() {
        // Fill history so the baseline is high and the cluster trends down,
        // then space the members out by more than a day.
        let mut store = EventStore::default();
        for i in 0..10 {
            ingest(&mut store, 6.0, -40.0 + i as f64 * 5.0, 20.0, 3000 - i);
        }
        ingest(&mut store, 0.5, 10.0, 100.0, 2900);
        ingest(&mut store, 0.5, 10.0, 100.0, 40);

        // Window large enough to hold everything.
        let forecast = ForecastEngine::new(&store).forecast_at(72, fixed_now());
        let report = ForecastEngine::new(&store).foreshock_report_at(72 * 60, 100.0, fixed_now());

        let low = report
            .clusters
            .iter()
            .find(|c| c.center_lat == 10.0)
            .expect("the two 0.5 events should cluster");
        // 5 + 5 + 0 + 5 + 1.43 = 16.4 → 16
        assert_eq!(low.foreshock_probability, 16);
        assert!(forecast.alerts.iter().all(|a| a.cluster_id != low.id));
        assert_eq!(forecast.total_clusters, report.total_clusters);
    }

    #[test]
    fn test_alerts_sorted_by_probability_descending() {
        let mut store = EventStore::default();
        // Weak pair in Greece: stable-ish small magnitudes.
        ingest(&mut store, 1.0, 38.0, 23.0, 20);
        ingest(&mut store, 1.0, 38.1, 23.1, 19);
        // Strong rising sequence near Tokyo.
        rising_sequence(&mut store);

        let forecast = ForecastEngine::new(&store).forecast_at(24, fixed_now());
        let probabilities: Vec<u8> = forecast.alerts.iter().map(|a| a.probability).collect();
        let mut sorted = probabilities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(probabilities, sorted);
        assert_eq!(forecast.alerts[0].location.lat, 35.75);
        assert_eq!(forecast.summary.max_probability, probabilities[0]);
    }

    #[test]
    fn test_recent_activity_is_newest_member_not_pass_time() {
        let mut store = EventStore::default();
        ingest(&mut store, 3.0, 35.60, 139.70, 30);
        ingest(&mut store, 3.5, 35.70, 139.75, 20);

        let forecast = ForecastEngine::new(&store).forecast_at(24, fixed_now());
        assert_eq!(
            forecast.alerts[0].recent_activity,
            fixed_now() - Duration::minutes(20),
            "a quiet cluster keeps its last member's time"
        );
    }

    #[test]
    fn test_forecast_is_idempotent() {
        let mut store = EventStore::default();
        rising_sequence(&mut store);
        let engine = ForecastEngine::new(&store);
        assert_eq!(engine.forecast_at(24, fixed_now()), engine.forecast_at(24, fixed_now()));
    }

    #[test]
    fn test_foreshock_report_breakdown() {
        let mut store = EventStore::default();
        rising_sequence(&mut store);
        let report = ForecastEngine::new(&store).foreshock_report_at(1440, 100.0, fixed_now());
        assert_eq!(report.total_clusters, 1);
        assert_eq!(report.summary.high, 1);
        assert_eq!(report.summary.moderate + report.summary.low, 0);
        assert_eq!(report.time_window_minutes, 1440);
    }

    #[test]
    fn test_cluster_analysis() {
        let mut store = EventStore::default();
        rising_sequence(&mut store);
        let engine = ForecastEngine::new(&store);

        let analysis = engine.cluster_analysis_at(1, fixed_now()).expect("cluster 1 exists");
        assert_eq!(analysis.cluster.member_count, 3);
        assert_eq!(analysis.spatial_density, 0.03);
        assert_eq!(analysis.time_span_minutes, 10.0);
        assert_eq!(analysis.regions, vec!["Pacific Ring of Fire".to_string()]);

        assert!(engine.cluster_analysis_at(2, fixed_now()).is_none());
    }
}
