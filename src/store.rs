//! Bounded, deduplicated earthquake history.
//!
//! The store is the single owner of the event history and its running
//! statistics. History is kept newest-first: `ingest_at` is the only path
//! that inserts, and it always inserts at the front. The clustering pass
//! relies on that ordering to stop walking at the first event outside its
//! time window.
//!
//! # Clock injection
//! Mutating functions accept a `now: DateTime<Utc>` parameter; the plain
//! variants call `Utc::now()` and exist for production callers.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::analysis::round2;
use crate::logging::{self, Component};
use crate::model::{DataStatus, Event, NewEvent, Stats, StatsSnapshot};

/// Default history capacity.
pub const DEFAULT_MAX_HISTORY: usize = 200;

#[derive(Debug, Clone)]
pub struct EventStore {
    /// Newest first.
    events: VecDeque<Event>,
    max_history: usize,
    last_id: u64,
    stats: Stats,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl EventStore {
    /// Creates an empty store retaining at most `max_history` events
    /// (a capacity of zero is raised to one).
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            events: VecDeque::with_capacity(max_history + 1),
            max_history,
            last_id: 0,
            stats: Stats::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Admits `record` into history at `now`.
    ///
    /// Returns `None` without touching any state when an event with the same
    /// non-empty external id is already retained. Otherwise the stored event
    /// is returned; callers use it as the signal to broadcast and re-analyse.
    pub fn ingest_at(&mut self, record: NewEvent, now: DateTime<Utc>) -> Option<Event> {
        if let Some(key) = record.dedup_key() {
            if self.contains_external_id(key) {
                logging::debug(Component::Store, Some(key), "duplicate rejected");
                return None;
            }
        }

        self.last_id += 1;
        let event = Event::admit(record, self.last_id, now);
        self.events.push_front(event.clone());

        if self.events.len() > self.max_history {
            if let Some(evicted) = self.events.pop_back() {
                logging::debug(
                    Component::Store,
                    Some(&evicted.id.to_string()),
                    "evicted oldest event at capacity",
                );
            }
        }

        self.stats.total_events += 1;
        self.stats.max_magnitude = self.stats.max_magnitude.max(event.magnitude);
        self.stats.last_event_at = Some(now);
        self.stats.average_magnitude = self.retained_average();
        self.stats.data_status = DataStatus::Active;
        self.stats.last_updated = Some(now);

        Some(event)
    }

    /// Convenience wrapper that stamps the event with the real current time.
    pub fn ingest(&mut self, record: NewEvent) -> Option<Event> {
        self.ingest_at(record, Utc::now())
    }

    /// Drops all history and zeroes count, max and average.
    ///
    /// Feed status and the id sequence are left alone: status reflects feed
    /// health, and ids are never reused.
    pub fn clear(&mut self) {
        self.events.clear();
        self.stats.total_events = 0;
        self.stats.max_magnitude = 0.0;
        self.stats.average_magnitude = 0.0;
    }

    /// Records the outcome of the latest upstream poll.
    pub fn set_data_status_at(&mut self, status: DataStatus, now: DateTime<Utc>) {
        self.stats.data_status = status;
        self.stats.last_updated = Some(now);
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Running statistics.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Running statistics plus point-in-time fields. `connected_clients` is
    /// owned by the broadcast layer and passed straight through.
    pub fn snapshot(&self, connected_clients: usize) -> StatsSnapshot {
        StatsSnapshot {
            stats: self.stats.clone(),
            history_len: self.events.len(),
            connected_clients,
        }
    }

    /// History, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Owned copy of the history, newest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    /// Looks up a retained event by its sequence id.
    pub fn get(&self, id: u64) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    fn contains_external_id(&self, key: &str) -> bool {
        self.events.iter().any(|e| e.dedup_key() == Some(key))
    }

    fn retained_average(&self) -> f64 {
        if self.events.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.events.iter().map(|e| e.magnitude).sum();
        round2(sum / self.events.len() as f64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// A fixed "now" used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn quake(id: &str, magnitude: f64) -> NewEvent {
        NewEvent::new(magnitude, 35.0, 139.0)
            .with_external_id(id)
            .with_source("USGS")
    }

    // --- Ingest -------------------------------------------------------------

    #[test]
    fn test_ingest_assigns_sequence_ids_and_keeps_newest_first() {
        let mut store = EventStore::default();
        let first = store.ingest_at(quake("a", 3.0), fixed_now()).expect("new event");
        let second = store
            .ingest_at(quake("b", 3.5), fixed_now() + Duration::minutes(1))
            .expect("new event");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        let order: Vec<u64> = store.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![2, 1], "history must be newest first");
        assert_eq!(second.ingested_at, fixed_now() + Duration::minutes(1));
    }

    #[test]
    fn test_duplicate_external_id_is_a_no_op() {
        let mut store = EventStore::default();
        store.ingest_at(quake("us7000abcd", 3.0), fixed_now());
        let before_stats = store.stats().clone();
        let before_len = store.len();

        let result = store.ingest_at(quake("us7000abcd", 6.5), fixed_now() + Duration::minutes(5));

        assert!(result.is_none(), "duplicate should be rejected");
        assert_eq!(store.len(), before_len);
        assert_eq!(store.stats(), &before_stats, "stats must not change on duplicate");
    }

    #[test]
    fn test_events_without_external_id_are_never_deduplicated() {
        let mut store = EventStore::default();
        assert!(store.ingest_at(NewEvent::new(3.0, 0.0, 0.0), fixed_now()).is_some());
        assert!(store.ingest_at(NewEvent::new(3.0, 0.0, 0.0), fixed_now()).is_some());
        assert!(
            store
                .ingest_at(NewEvent::new(3.0, 0.0, 0.0).with_external_id(""), fixed_now())
                .is_some()
        );
        assert!(
            store
                .ingest_at(NewEvent::new(3.0, 0.0, 0.0).with_external_id(""), fixed_now())
                .is_some()
        );
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_history_is_capped_and_oldest_evicted() {
        let mut store = EventStore::new(3);
        for i in 0..4 {
            store.ingest_at(quake(&format!("q{}", i), 2.0), fixed_now());
        }

        assert_eq!(store.len(), 3);
        assert!(
            store.iter().all(|e| e.external_id.as_deref() != Some("q0")),
            "oldest event should have been evicted"
        );
        assert_eq!(store.stats().total_events, 4, "count tracks accepted events, not retained");
    }

    #[test]
    fn test_evicted_external_id_can_be_ingested_again() {
        let mut store = EventStore::new(1);
        store.ingest_at(quake("a", 2.0), fixed_now());
        store.ingest_at(quake("b", 2.0), fixed_now());
        assert!(
            store.ingest_at(quake("a", 2.0), fixed_now()).is_some(),
            "dedup only looks at retained history"
        );
    }

    #[test]
    fn test_default_capacity_is_200() {
        let mut store = EventStore::default();
        for i in 0..201 {
            store.ingest_at(quake(&format!("q{}", i), 2.0), fixed_now());
        }
        assert_eq!(store.max_history(), DEFAULT_MAX_HISTORY);
        assert_eq!(store.len(), 200);
        assert!(store.get(1).is_none(), "first event should be gone after cap+1 ingests");
        assert!(store.get(201).is_some());
    }

    // --- Stats --------------------------------------------------------------

    #[test]
    fn test_max_magnitude_is_non_decreasing() {
        let mut store = EventStore::default();
        let mut previous = 0.0;
        for (i, mag) in [3.0, 5.1, 2.2, 4.9, 5.3].iter().enumerate() {
            store.ingest_at(quake(&format!("q{}", i), *mag), fixed_now());
            let max = store.stats().max_magnitude;
            assert!(max >= previous, "max went from {} to {}", previous, max);
            previous = max;
        }
        assert_eq!(previous, 5.3);
    }

    #[test]
    fn test_average_is_over_retained_history_rounded_to_two_places() {
        let mut store = EventStore::new(2);
        store.ingest_at(quake("a", 9.0), fixed_now());
        store.ingest_at(quake("b", 1.0), fixed_now());
        store.ingest_at(quake("c", 2.0), fixed_now());
        // 9.0 was evicted; average of 1.0 and 2.0.
        assert_eq!(store.stats().average_magnitude, 1.5);
        assert_eq!(store.stats().max_magnitude, 9.0, "max survives eviction");

        let mut store = EventStore::default();
        store.ingest_at(quake("a", 1.0), fixed_now());
        store.ingest_at(quake("b", 1.0), fixed_now());
        store.ingest_at(quake("c", 2.0), fixed_now());
        assert_eq!(store.stats().average_magnitude, 1.33);
    }

    #[test]
    fn test_ingest_marks_feed_active() {
        let mut store = EventStore::default();
        assert_eq!(store.stats().data_status, DataStatus::Initializing);
        assert_eq!(store.stats().last_updated, None);

        store.ingest_at(quake("a", 3.0), fixed_now());
        assert_eq!(store.stats().data_status, DataStatus::Active);
        assert_eq!(store.stats().last_event_at, Some(fixed_now()));
        assert_eq!(store.stats().last_updated, Some(fixed_now()));
    }

    // --- Clear --------------------------------------------------------------

    #[test]
    fn test_clear_resets_totals_but_not_status_or_ids() {
        let mut store = EventStore::default();
        store.ingest_at(quake("a", 4.0), fixed_now());
        store.set_data_status_at(DataStatus::Error, fixed_now());
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.stats().total_events, 0);
        assert_eq!(store.stats().max_magnitude, 0.0);
        assert_eq!(store.stats().average_magnitude, 0.0);
        assert_eq!(store.stats().data_status, DataStatus::Error, "clear must not touch status");

        let next = store.ingest_at(quake("b", 2.0), fixed_now()).expect("new event");
        assert_eq!(next.id, 2, "ids are never reused");
    }

    #[test]
    fn test_snapshot_passes_connected_clients_through() {
        let mut store = EventStore::default();
        store.ingest_at(quake("a", 4.0), fixed_now());
        let snapshot = store.snapshot(7);
        assert_eq!(snapshot.history_len, 1);
        assert_eq!(snapshot.connected_clients, 7);
        assert_eq!(snapshot.stats.total_events, 1);
    }
}
