//! Productivity aggregation, classification, alerting and route tracing.
//!
//! Every analyzer is a pure function over a slice of [`crate::model::Reading`]
//! or over the per-equipment summaries derived from it.

pub mod alerts;
pub mod classify;
pub mod geo;
pub mod hourly;
pub mod productivity;
pub mod snapshot;
pub mod types;
pub mod utility;
