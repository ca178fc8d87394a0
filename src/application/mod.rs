//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the two entry points: screening one panel and evaluating the model.

mod prediction;
mod report;

pub use prediction::PredictionService;
pub use report::{MetricsReport, ReportService};
