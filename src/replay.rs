//! Feed replay for development and offline testing
//!
//! When the live USGS feed is unavailable, a saved summary document can be
//! pushed through the monitor exactly as a poll would: features are ingested
//! in document order, duplicates are dropped, and the feed status is updated
//! to reflect the outcome.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ingest::usgs::parse_feed;
use crate::logging::{self, Component};
use crate::model::FeedError;
use crate::monitor::{Notifier, QuakeMonitor};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read feed file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Outcome of one replayed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReplaySummary {
    /// Features in the document.
    pub total: usize,
    pub accepted: usize,
    pub duplicates: usize,
    /// Features without a magnitude.
    pub skipped: usize,
}

/// Replay a feed document held in memory, stamping every event with `now`.
///
/// A document that fails to parse marks the feed as errored and leaves the
/// history untouched.
pub fn replay_feed_at<N: Notifier>(
    monitor: &mut QuakeMonitor<N>,
    json: &str,
    now: DateTime<Utc>,
) -> Result<ReplaySummary, ReplayError> {
    let parsed = match parse_feed(json) {
        Ok(parsed) => parsed,
        Err(e) => {
            monitor.mark_feed_error_at(&e.to_string(), now);
            return Err(e.into());
        }
    };

    let mut summary = ReplaySummary {
        total: parsed.events.len() + parsed.skipped,
        skipped: parsed.skipped,
        ..ReplaySummary::default()
    };

    for record in parsed.events {
        match monitor.ingest_at(record, now) {
            Some(_) => summary.accepted += 1,
            None => summary.duplicates += 1,
        }
    }

    logging::log_ingest_summary(
        Component::Feed,
        summary.total - summary.skipped,
        summary.accepted,
        summary.duplicates,
    );
    if summary.skipped > 0 {
        logging::debug(
            Component::Feed,
            None,
            &format!("{} features without magnitude skipped", summary.skipped),
        );
    }

    monitor.mark_feed_active_at(now);
    Ok(summary)
}

/// Read and replay a saved feed file.
pub fn replay_feed_file<N: Notifier>(
    monitor: &mut QuakeMonitor<N>,
    path: impl AsRef<Path>,
) -> Result<ReplaySummary, ReplayError> {
    let path = path.as_ref();
    let now = Utc::now();

    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(source) => {
            monitor.mark_feed_error_at(&source.to_string(), now);
            return Err(ReplayError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    logging::info(
        Component::Feed,
        None,
        &format!("Replaying feed from {}", path.display()),
    );
    replay_feed_at(monitor, &json, now)
}
