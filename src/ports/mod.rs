//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits separate the screening
//! logic from the model artifact format and the report image backend.

mod charts;
mod classifier;

pub use charts::{ChartRenderer, FeatureImportance, RenderError};
pub use classifier::{ModelError, ProbabilityModel};
