//! Earthquake event store and foreshock forecast service.
//!
//! Ingests detections from the USGS summary feed or manual submissions,
//! keeps a bounded deduplicated history, groups recent events into
//! spatiotemporal clusters, and scores each cluster's likelihood of preceding
//! a larger main shock.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod regions;
pub mod replay;
pub mod store;
