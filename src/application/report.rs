//! Report service: Evaluates the model against the labeled test set.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::adapters::{ForestModel, LabeledDataset};
use crate::config::Settings;
use crate::domain::{ClassificationMetrics, ConfusionMatrix, FEATURE_NAMES};
use crate::ports::{ChartRenderer, FeatureImportance, ProbabilityModel};
use crate::HemascreenError;

/// Evaluation results as delivered to the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,

    /// Base64 PNG of the confusion-matrix heat map
    pub cm_image: String,

    /// Base64 PNG of the feature-importance bar chart
    pub fi_image: String,

    /// `[[tn, fp], [fn, tp]]`
    pub confusion_matrix: [[usize; 2]; 2],

    /// Importances, largest first
    pub feature_importance: Vec<FeatureImportance>,

    /// Number of evaluated rows
    pub support: usize,
}

/// Service producing the model evaluation report.
pub struct ReportService<R: ChartRenderer> {
    model_path: PathBuf,
    test_data_path: PathBuf,
    require_manifest: bool,
    renderer: R,
}

impl<R: ChartRenderer> ReportService<R> {
    pub fn new(settings: &Settings, renderer: R) -> Self {
        Self {
            model_path: settings.model_path.clone(),
            test_data_path: settings.test_data_path.clone(),
            require_manifest: settings.require_manifest,
            renderer,
        }
    }

    /// Load model and test set from disk and evaluate.
    ///
    /// # Errors
    /// - `HemascreenError::ArtifactMissing` if either file is absent
    /// - `HemascreenError::Model` / `Dataset` / `Render` for downstream failures
    pub fn generate(&self) -> Result<MetricsReport, HemascreenError> {
        if !self.model_path.is_file() || !self.test_data_path.is_file() {
            tracing::error!(
                "Report inputs missing (model={:?}, test data={:?})",
                self.model_path,
                self.test_data_path
            );
            return Err(HemascreenError::ArtifactMissing(
                "Model or Test data file not found.".into(),
            ));
        }

        let model = ForestModel::load(&self.model_path, self.require_manifest)?;
        let dataset = LabeledDataset::load(&self.test_data_path)?;
        self.evaluate(&model, &dataset)
    }

    /// Evaluate `model` on `dataset` and render both figures.
    ///
    /// # Errors
    /// Returns an error if prediction or rendering fails.
    pub fn evaluate(
        &self,
        model: &dyn ProbabilityModel,
        dataset: &LabeledDataset,
    ) -> Result<MetricsReport, HemascreenError> {
        let predicted = dataset
            .features
            .iter()
            .map(|f| model.predict(f))
            .collect::<Result<Vec<u8>, _>>()?;

        let matrix = ConfusionMatrix::from_labels(&dataset.labels, &predicted);
        let metrics = ClassificationMetrics::from(&matrix);

        let importances = model.feature_importances();
        if importances.len() != FEATURE_NAMES.len() {
            return Err(HemascreenError::Runtime(format!(
                "Model reports {} feature importances, expected {}",
                importances.len(),
                FEATURE_NAMES.len()
            )));
        }
        let mut bars: Vec<FeatureImportance> = FEATURE_NAMES
            .iter()
            .zip(importances)
            .map(|(name, &importance)| FeatureImportance {
                name: (*name).to_string(),
                importance,
            })
            .collect();

        // Ascending for the chart: the most important feature is drawn on top.
        bars.sort_by(|a, b| a.importance.total_cmp(&b.importance));
        let cm_png = self.renderer.confusion_matrix(&matrix)?;
        let fi_png = self.renderer.feature_importance(&bars)?;
        bars.reverse();

        tracing::info!(
            "Evaluated {} rows: accuracy={:.2} precision={:.2} recall={:.2} f1={:.2}",
            matrix.total(),
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1
        );

        Ok(MetricsReport {
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            f1: metrics.f1,
            cm_image: STANDARD.encode(cm_png),
            fi_image: STANDARD.encode(fi_png),
            confusion_matrix: matrix.to_rows(),
            feature_importance: bars,
            support: dataset.len(),
        })
    }
}
