//! Upstream record normalization.
//!
//! Each submodule turns one external format into `model::NewEvent`s. None of
//! them touch the store; the monitor decides what to do with the records.

pub mod manual;
pub mod usgs;
