//! Classifier port: The pre-trained thalassemia model as a capability.
//!
//! The application never sees the model's internal representation, only
//! this contract. Tests substitute stubs.

use crate::domain::FeatureVector;

/// Errors raised while loading or evaluating a model artifact.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(String),

    #[error("Failed to read model artifact: {0}")]
    Io(String),

    #[error("Invalid model artifact: {0}")]
    Format(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),

    #[error("Model inference failed: {0}")]
    Inference(String),
}

/// A binary classifier over the 11-feature blood-count vector.
///
/// Implementations are read-only after load and safe for concurrent reads.
pub trait ProbabilityModel: Send + Sync {
    /// Positive-class (thalassemia) probability in [0, 1].
    ///
    /// # Errors
    /// Returns `ModelError::Inference` if the model cannot be evaluated.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Hard label: 1 when the positive class is strictly more probable.
    ///
    /// # Errors
    /// Propagates errors from `predict_probability`.
    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let p = self.predict_probability(features)?;
        Ok(u8::from(p > 1.0 - p))
    }

    /// Per-feature importance, aligned with [`crate::domain::FEATURE_NAMES`].
    fn feature_importances(&self) -> &[f64];
}
