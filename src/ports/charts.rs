//! Chart port: Renders report figures to encoded image bytes.

use serde::{Deserialize, Serialize};

use crate::domain::ConfusionMatrix;

/// Errors that can occur while rendering a chart.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("Nothing to plot: {0}")]
    EmptyInput(String),

    #[error("Canvas too small: {0}")]
    CanvasTooSmall(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),
}

/// One bar of the feature-importance chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

/// Trait for report figure rendering.
pub trait ChartRenderer {
    /// Render the 2x2 confusion matrix as a heat map.
    ///
    /// # Errors
    /// Returns `RenderError::CanvasTooSmall` if there is no room for the
    /// cells, or `RenderError::Encoding` if the image cannot be encoded.
    fn confusion_matrix(&self, matrix: &ConfusionMatrix) -> Result<Vec<u8>, RenderError>;

    /// Render a horizontal bar chart, one bar per feature, in the given order
    /// from bottom to top.
    ///
    /// # Errors
    /// Returns `RenderError::EmptyInput` for an empty slice, or
    /// `RenderError::CanvasTooSmall` if the bars do not fit.
    fn feature_importance(&self, bars: &[FeatureImportance]) -> Result<Vec<u8>, RenderError>;
}
