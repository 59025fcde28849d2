//! Foreshock alerting.
//!
//! Submodules:
//! - `scoring`: converts cluster features into a 0 to 100 probability.
//! - `thresholds`: maps probabilities onto MODERATE / HIGH alert tiers.
//! - `forecast`: orchestrates detection and scoring into a ranked forecast.
//! - `stalenesses`: flags a feed that has stopped updating.

pub mod forecast;
pub mod scoring;
pub mod stalenesses;
pub mod thresholds;
