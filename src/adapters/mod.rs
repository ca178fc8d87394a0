//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `forest`: JSON-exported random forest behind `ProbabilityModel`
//! - `dataset`: labeled CSV test set for the metrics report
//! - `png`: `image`-backed `ChartRenderer`
//! - `sanitize`: patient-data filtering for logs

pub mod dataset;
pub mod forest;
pub mod png;
pub mod sanitize;

pub use dataset::{DatasetError, LabeledDataset};
pub use forest::ForestModel;
pub use png::PngChartRenderer;
