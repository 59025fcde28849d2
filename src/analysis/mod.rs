//! Spatiotemporal analysis of the event history.
//!
//! Submodules:
//! - `geo`: great-circle distance between two coordinates.
//! - `trend`: classifies whether magnitudes in a group are rising.
//! - `clusters`: groups recent events into chained spatial clusters.

pub mod clusters;
pub mod geo;
pub mod trend;

/// Rounds to 2 decimal places, the precision averages are reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
