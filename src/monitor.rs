//! Single-owner orchestration of the earthquake store and forecast engine.
//!
//! `QuakeMonitor` owns the `EventStore` and pushes every observable change
//! through a `Notifier`. For each accepted event the order is fixed:
//!
//! 1. `new_earthquake` with the stored event
//! 2. `foreshock_alert`, only when some cluster's probability passes 30
//! 3. `forecast_update` with a fresh forecast
//!
//! Duplicates emit nothing. `SharedMonitor` wraps a monitor in a lock for
//! multi-threaded callers; each call holds the lock for its full duration
//! and returns owned snapshots.

use std::sync::Arc;
use std::sync::mpsc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::alert::forecast::{DEFAULT_FORECAST_HOURS, ForecastEngine};
use crate::alert::stalenesses::is_feed_stale_at;
use crate::alert::thresholds::{ALERT_THRESHOLD, HIGH_THRESHOLD};
use crate::config::MonitorConfig;
use crate::ingest::manual::{ManualSubmission, normalize_submission_at};
use crate::logging::{self, Component};
use crate::model::{
    Cluster, ClusterAnalysis, DataStatus, Event, FeedError, Forecast, ForeshockReport, NewEvent,
    StatsSnapshot,
};
use crate::store::EventStore;

// ---------------------------------------------------------------------------
// Broadcast messages
// ---------------------------------------------------------------------------

/// Clusters past the alert threshold, split by tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAlert {
    /// Probability above 60.
    pub high_probability: Vec<Cluster>,
    /// Probability above 30 and at most 60.
    pub moderate_probability: Vec<Cluster>,
}

/// Messages pushed to subscribers, serialized as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Broadcast {
    NewEarthquake(Event),
    ForeshockAlert(ClusterAlert),
    ForecastUpdate(Forecast),
    EarthquakesCleared,
}

/// Receives broadcasts. Delivery is fire-and-forget; a notifier must not
/// block or fail the monitor.
pub trait Notifier {
    fn notify(&self, message: &Broadcast);
}

/// Discards every broadcast.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &Broadcast) {}
}

impl Notifier for mpsc::Sender<Broadcast> {
    fn notify(&self, message: &Broadcast) {
        if self.send(message.clone()).is_err() {
            logging::debug(Component::System, None, "broadcast dropped: receiver gone");
        }
    }
}

// ---------------------------------------------------------------------------
// Stats view
// ---------------------------------------------------------------------------

/// Running stats with the current 24 h forecast embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStats {
    #[serde(flatten)]
    pub snapshot: StatsSnapshot,
    pub forecast: Forecast,
}

// ---------------------------------------------------------------------------
// QuakeMonitor
// ---------------------------------------------------------------------------

pub struct QuakeMonitor<N = NoopNotifier> {
    store: EventStore,
    config: MonitorConfig,
    notifier: N,
    connected_clients: usize,
}

impl QuakeMonitor<NoopNotifier> {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_notifier(config, NoopNotifier)
    }
}

impl<N: Notifier> QuakeMonitor<N> {
    pub fn with_notifier(config: MonitorConfig, notifier: N) -> Self {
        Self {
            store: EventStore::new(config.max_history),
            config,
            notifier,
            connected_clients: 0,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Read-only analysis view. Borrowing it blocks mutation until dropped.
    pub fn engine(&self) -> ForecastEngine<'_> {
        ForecastEngine::new(&self.store)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Admit `record` at `now` and broadcast the consequences.
    ///
    /// Returns the stored event, or `None` for a duplicate.
    pub fn ingest_at(&mut self, record: NewEvent, now: DateTime<Utc>) -> Option<Event> {
        let event = self.store.ingest_at(record, now)?;
        self.notifier.notify(&Broadcast::NewEarthquake(event.clone()));

        if event.magnitude >= self.config.alert_magnitude {
            logging::warn(
                Component::Feed,
                event.external_id.as_deref(),
                &format!(
                    "Significant earthquake: magnitude {} - {}",
                    event.magnitude,
                    event.place.as_deref().unwrap_or("unknown place")
                ),
            );
        }

        let clusters = self.engine().clusters_at(
            self.config.cluster_window_minutes,
            self.config.cluster_radius_km,
            now,
        );
        if let Some(alert) = cluster_alert(clusters) {
            self.notifier.notify(&Broadcast::ForeshockAlert(alert));
        }

        let forecast = self.engine().forecast_at(self.config.forecast_hours, now);
        self.notifier.notify(&Broadcast::ForecastUpdate(forecast));

        Some(event)
    }

    pub fn ingest(&mut self, record: NewEvent) -> Option<Event> {
        self.ingest_at(record, Utc::now())
    }

    /// Normalize and ingest a manual submission.
    pub fn submit_manual_at(
        &mut self,
        submission: ManualSubmission,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, FeedError> {
        let record = normalize_submission_at(submission, now)?;
        logging::info(
            Component::Feed,
            record.external_id.as_deref(),
            &format!(
                "Manual earthquake added: magnitude {} at {}",
                record.magnitude,
                record.place.as_deref().unwrap_or_default()
            ),
        );
        Ok(self.ingest_at(record, now))
    }

    pub fn submit_manual(&mut self, submission: ManualSubmission) -> Result<Option<Event>, FeedError> {
        self.submit_manual_at(submission, Utc::now())
    }

    /// Drop all history and broadcast `earthquakes_cleared`.
    pub fn clear(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        logging::info(
            Component::Store,
            None,
            &format!("History cleared ({} events dropped)", dropped),
        );
        self.notifier.notify(&Broadcast::EarthquakesCleared);
    }

    pub fn mark_feed_active_at(&mut self, now: DateTime<Utc>) {
        if self.store.stats().data_status != DataStatus::Active {
            logging::info(Component::Feed, None, "Feed status → ACTIVE");
        }
        self.store.set_data_status_at(DataStatus::Active, now);
    }

    pub fn mark_feed_active(&mut self) {
        self.mark_feed_active_at(Utc::now());
    }

    /// Record a failed poll. History is left untouched.
    pub fn mark_feed_error_at(&mut self, reason: &str, now: DateTime<Utc>) {
        logging::error(Component::Feed, None, &format!("Feed status → ERROR: {}", reason));
        self.store.set_data_status_at(DataStatus::Error, now);
    }

    pub fn mark_feed_error(&mut self, reason: &str) {
        self.mark_feed_error_at(reason, Utc::now());
    }

    /// Returns the new subscriber count.
    pub fn client_connected(&mut self) -> usize {
        self.connected_clients += 1;
        self.connected_clients
    }

    /// Returns the new subscriber count; never goes below zero.
    pub fn client_disconnected(&mut self) -> usize {
        self.connected_clients = self.connected_clients.saturating_sub(1);
        self.connected_clients
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn forecast_at(&self, hours: u32, now: DateTime<Utc>) -> Forecast {
        self.engine().forecast_at(hours, now)
    }

    pub fn forecast(&self, hours: u32) -> Forecast {
        self.forecast_at(hours, Utc::now())
    }

    pub fn clusters_at(&self, window_minutes: u64, radius_km: f64, now: DateTime<Utc>) -> Vec<Cluster> {
        self.engine().clusters_at(window_minutes, radius_km, now)
    }

    pub fn clusters(&self, window_minutes: u64, radius_km: f64) -> Vec<Cluster> {
        self.clusters_at(window_minutes, radius_km, Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> MonitorStats {
        MonitorStats {
            snapshot: self.store.snapshot(self.connected_clients),
            forecast: self.forecast_at(DEFAULT_FORECAST_HOURS, now),
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats_at(Utc::now())
    }

    pub fn event(&self, id: u64) -> Option<Event> {
        self.store.get(id).cloned()
    }

    /// Retained history, newest first.
    pub fn events(&self) -> Vec<Event> {
        self.store.events()
    }

    pub fn foreshock_report_at(
        &self,
        window_minutes: u64,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> ForeshockReport {
        self.engine().foreshock_report_at(window_minutes, radius_km, now)
    }

    pub fn foreshock_report(&self, window_minutes: u64, radius_km: f64) -> ForeshockReport {
        self.foreshock_report_at(window_minutes, radius_km, Utc::now())
    }

    pub fn cluster_analysis_at(&self, id: usize, now: DateTime<Utc>) -> Option<ClusterAnalysis> {
        self.engine().cluster_analysis_at(id, now)
    }

    pub fn cluster_analysis(&self, id: usize) -> Option<ClusterAnalysis> {
        self.cluster_analysis_at(id, Utc::now())
    }

    pub fn is_feed_stale_at(&self, now: DateTime<Utc>) -> bool {
        is_feed_stale_at(self.store.stats(), self.config.feed_stale_minutes, now)
    }

    pub fn is_feed_stale(&self) -> bool {
        self.is_feed_stale_at(Utc::now())
    }
}

/// Splits clusters past the alert threshold by tier, or `None` when no
/// cluster passes it.
fn cluster_alert(clusters: Vec<Cluster>) -> Option<ClusterAlert> {
    let (high, moderate): (Vec<Cluster>, Vec<Cluster>) = clusters
        .into_iter()
        .filter(|c| c.foreshock_probability > ALERT_THRESHOLD)
        .partition(|c| c.foreshock_probability > HIGH_THRESHOLD);

    if high.is_empty() && moderate.is_empty() {
        return None;
    }
    Some(ClusterAlert {
        high_probability: high,
        moderate_probability: moderate,
    })
}

// ---------------------------------------------------------------------------
// SharedMonitor
// ---------------------------------------------------------------------------

/// Thread-safe handle to a `QuakeMonitor`. Clones share the same monitor.
pub struct SharedMonitor<N = NoopNotifier> {
    inner: Arc<Mutex<QuakeMonitor<N>>>,
}

impl<N> Clone for SharedMonitor<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N: Notifier> SharedMonitor<N> {
    pub fn new(monitor: QuakeMonitor<N>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(monitor)),
        }
    }

    /// Run `f` with exclusive access to the monitor.
    pub fn with_monitor<R>(&self, f: impl FnOnce(&mut QuakeMonitor<N>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    pub fn ingest(&self, record: NewEvent) -> Option<Event> {
        self.inner.lock().ingest(record)
    }

    pub fn submit_manual(&self, submission: ManualSubmission) -> Result<Option<Event>, FeedError> {
        self.inner.lock().submit_manual(submission)
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }

    pub fn forecast(&self, hours: u32) -> Forecast {
        self.inner.lock().forecast(hours)
    }

    pub fn clusters(&self, window_minutes: u64, radius_km: f64) -> Vec<Cluster> {
        self.inner.lock().clusters(window_minutes, radius_km)
    }

    pub fn stats(&self) -> MonitorStats {
        self.inner.lock().stats()
    }

    pub fn event(&self, id: u64) -> Option<Event> {
        self.inner.lock().event(id)
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().events()
    }

    pub fn foreshock_report(&self, window_minutes: u64, radius_km: f64) -> ForeshockReport {
        self.inner.lock().foreshock_report(window_minutes, radius_km)
    }

    pub fn cluster_analysis(&self, id: usize) -> Option<ClusterAnalysis> {
        self.inner.lock().cluster_analysis(id)
    }

    pub fn mark_feed_active(&self) {
        self.inner.lock().mark_feed_active()
    }

    pub fn mark_feed_error(&self, reason: &str) {
        self.inner.lock().mark_feed_error(reason)
    }

    pub fn client_connected(&self) -> usize {
        self.inner.lock().client_connected()
    }

    pub fn client_disconnected(&self) -> usize {
        self.inner.lock().client_disconnected()
    }

    pub fn is_feed_stale(&self) -> bool {
        self.inner.lock().is_feed_stale()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
