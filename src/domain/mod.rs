//! Domain layer: Core screening types and decision logic.
//!
//! Pure functions and plain data; no I/O. Everything here is deterministic
//! and safe to share across threads.

mod diagnosis;
mod indices;
mod metrics;
mod patient;

pub use diagnosis::{
    classify_iron, classify_thalassemia, hb_threshold, IronAssessment, IronPathway, IronStatus,
    PredictionVerdict, SeverityColor, ThalassemiaStatus, LIKELY_THALASSEMIA_CUTOFF,
    MENTZER_CUTOFF, RDW_CUTOFF, THALASSEMIA_CUTOFF,
};
pub use indices::{round_to, DerivedIndices};
pub use metrics::{ClassificationMetrics, ConfusionMatrix};
pub use patient::{FeatureVector, Gender, PatientObservation, FEATURE_COUNT, FEATURE_NAMES};
