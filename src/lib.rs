//! # Hemascreen
//!
//! Clinical decision support for a single blood-count panel.
//!
//! This crate provides:
//! - Thalassemia Minor screening from a pre-trained random forest
//! - Rule-based Iron Deficiency Anemia screening (Mentzer / Green & King)
//! - An evaluation report for the model against a labeled test set
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core screening types and decision rules
//! - `ports`: Trait definitions for the model and chart rendering
//! - `adapters`: Concrete implementations (forest JSON, CSV, PNG, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{DerivedIndices, PatientObservation, PredictionVerdict};

/// Result type for Hemascreen operations
pub type Result<T> = std::result::Result<T, HemascreenError>;

/// Main error type for Hemascreen
#[derive(Debug, thiserror::Error)]
pub enum HemascreenError {
    /// Missing or unparsable input; the message is shown to the caller as-is
    #[error("{0}")]
    Input(String),

    /// A required artifact is absent; the message is shown to the caller as-is
    #[error("{0}")]
    ArtifactMissing(String),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Invalid test data: {0}")]
    Dataset(#[from] adapters::DatasetError),

    #[error("Chart rendering failed: {0}")]
    Render(#[from] ports::RenderError),

    #[error("{0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The single-field payload every failure is reported as.
#[must_use]
pub fn error_payload(error: &HemascreenError) -> serde_json::Value {
    serde_json::json!({ "error": error.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_has_only_error_key() {
        let payload = error_payload(&HemascreenError::Input("Missing input arguments".into()));
        assert_eq!(payload.to_string(), r#"{"error":"Missing input arguments"}"#);
    }

    #[test]
    fn test_model_error_converts() {
        let err: HemascreenError = ports::ModelError::Format("bad".into()).into();
        assert!(matches!(err, HemascreenError::Model(_)));
        assert!(err.to_string().contains("bad"));
    }
}
