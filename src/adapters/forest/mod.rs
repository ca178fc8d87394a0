//! Forest adapter: Implementation of ProbabilityModel for an exported
//! random-forest classifier.
//!
//! # Artifact format
//!
//! The training pipeline exports the fitted forest as JSON:
//!
//! ```json
//! {
//!   "feature_names": ["Hb", "MCV", ...],
//!   "feature_importances": [0.12, ...],
//!   "trees": [{
//!     "children_left":  [1, -1, -1],
//!     "children_right": [2, -1, -1],
//!     "feature":        [9, -2, -2],
//!     "threshold":      [13.0, -2.0, -2.0],
//!     "value":          [[50.0, 50.0], [5.0, 40.0], [45.0, 10.0]]
//!   }]
//! }
//! ```
//!
//! Nodes are stored depth-first: a leaf has `children_left == -1`, and an
//! internal node's children always have larger indices than the node itself.
//! Leaf `value` holds `[negative, positive]` class weights.
//!
//! # Integrity
//!
//! When a `manifest.json` sits next to the artifact, the artifact's SHA-256
//! digest must match the one recorded there (see the `sign_model` binary).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{ModelError, ProbabilityModel};

/// File name of the integrity manifest, resolved next to the model artifact.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// One decision tree in sklearn's parallel-array layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

/// Forest parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedForest {
    pub feature_names: Vec<String>,
    pub feature_importances: Vec<f64>,
    pub trees: Vec<ExportedTree>,
}

/// Integrity manifest binding artifact file names to SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// Lower-case hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl ExportedTree {
    fn validate(&self, index: usize) -> Result<(), ModelError> {
        let n = self.children_left.len();
        if n == 0 {
            return Err(ModelError::Format(format!("tree {index} has no nodes")));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(ModelError::Format(format!(
                "tree {index}: node arrays have mismatched lengths"
            )));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);

            if left < 0 || right < 0 {
                if left != right {
                    return Err(ModelError::Format(format!(
                        "tree {index}, node {node}: half-open split"
                    )));
                }
                let [neg, pos] = self.value[node];
                if !(neg.is_finite() && pos.is_finite() && neg >= 0.0 && pos >= 0.0)
                    || neg + pos <= 0.0
                {
                    return Err(ModelError::Format(format!(
                        "tree {index}, node {node}: invalid leaf weights"
                    )));
                }
                continue;
            }

            let in_range = |child: i64| child as usize > node && (child as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(ModelError::Format(format!(
                    "tree {index}, node {node}: child index out of order"
                )));
            }
            if !(0..FEATURE_COUNT as i64).contains(&self.feature[node]) {
                return Err(ModelError::Format(format!(
                    "tree {index}, node {node}: feature index {} out of range",
                    self.feature[node]
                )));
            }
            if self.threshold[node].is_nan() {
                return Err(ModelError::Format(format!(
                    "tree {index}, node {node}: NaN threshold"
                )));
            }
        }

        Ok(())
    }

    /// Class weights of the leaf reached by `x`.
    fn leaf(&self, x: &[f64; FEATURE_COUNT]) -> [f64; 2] {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            // Thresholds were learned on single-precision inputs.
            let value = f64::from(x[self.feature[node] as usize] as f32);
            node = if value <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }

    /// Normalized `[negative, positive]` class probabilities for `x`.
    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> [f64; 2] {
        let [neg, pos] = self.leaf(x);
        let total = neg + pos;
        [neg / total, pos / total]
    }
}

/// Random-forest thalassemia classifier loaded from a JSON export.
#[derive(Debug, Clone)]
pub struct ForestModel {
    forest: ExportedForest,
}

impl ForestModel {
    /// Build a model from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError::Format` if the forest does not match the
    /// 11-feature contract or any tree is malformed.
    pub fn from_export(forest: ExportedForest) -> Result<Self, ModelError> {
        if forest.feature_names.len() != FEATURE_COUNT
            || forest
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(got, want)| got != want)
        {
            return Err(ModelError::Format(format!(
                "feature_names must be {FEATURE_NAMES:?}, got {:?}",
                forest.feature_names
            )));
        }
        if forest.feature_importances.len() != FEATURE_COUNT {
            return Err(ModelError::Format(format!(
                "expected {FEATURE_COUNT} feature importances, got {}",
                forest.feature_importances.len()
            )));
        }
        if forest.trees.is_empty() {
            return Err(ModelError::Format("forest has no trees".into()));
        }
        for (i, tree) in forest.trees.iter().enumerate() {
            tree.validate(i)?;
        }

        Ok(Self { forest })
    }

    /// Load and validate the model artifact at `path`.
    ///
    /// # Errors
    /// - `ModelError::NotFound` if the artifact does not exist
    /// - `ModelError::Integrity` if the manifest check fails
    /// - `ModelError::Io` / `ModelError::Format` for unreadable or malformed JSON
    pub fn load(path: &Path, require_manifest: bool) -> Result<Self, ModelError> {
        if !path.is_file() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }

        let bytes = fs::read(path).map_err(|e| ModelError::Io(e.to_string()))?;
        Self::verify_manifest(path, &bytes, require_manifest)?;

        let forest: ExportedForest =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Format(e.to_string()))?;
        let model = Self::from_export(forest)?;

        tracing::info!(
            "Loaded model from {:?} (trees={}, features={})",
            path,
            model.n_trees(),
            FEATURE_COUNT
        );

        Ok(model)
    }

    /// Check the artifact bytes against `manifest.json`, if present.
    fn verify_manifest(path: &Path, bytes: &[u8], require: bool) -> Result<(), ModelError> {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let manifest_path = base_dir.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            if require {
                tracing::error!("Model manifest not found at {:?}", manifest_path);
                return Err(ModelError::Integrity(format!(
                    "{MANIFEST_FILE} required but not found next to the model"
                )));
            }
            tracing::warn!("No {} next to model; skipping integrity check", MANIFEST_FILE);
            return Ok(());
        }

        let content = fs::read(&manifest_path)
            .map_err(|e| ModelError::Integrity(format!("Failed to read manifest: {e}")))?;
        let manifest: ModelManifest = serde_json::from_slice(&content)
            .map_err(|e| ModelError::Integrity(format!("Invalid manifest format: {e}")))?;

        if manifest.version != MANIFEST_VERSION {
            return Err(ModelError::Integrity(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ModelError::Integrity("Model path has no file name".into()))?;
        let expected = manifest.files.get(file_name).ok_or_else(|| {
            ModelError::Integrity(format!("{MANIFEST_FILE} does not list {file_name}"))
        })?;

        if !sha256_hex(bytes).eq_ignore_ascii_case(expected.trim()) {
            return Err(ModelError::Integrity(format!(
                "File hash mismatch for {file_name}"
            )));
        }

        tracing::debug!("Model digest matches {}", MANIFEST_FILE);
        Ok(())
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.forest.trees.len()
    }

    /// Mean class probabilities over all trees: `[negative, positive]`.
    fn predict_proba(&self, features: &FeatureVector) -> [f64; 2] {
        let x = features.to_array();
        let mut sum = [0.0_f64; 2];
        for tree in &self.forest.trees {
            let [neg, pos] = tree.predict_proba(&x);
            sum[0] += neg;
            sum[1] += pos;
        }
        let n = self.forest.trees.len() as f64;
        [sum[0] / n, sum[1] / n]
    }
}

impl ProbabilityModel for ForestModel {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let [_, pos] = self.predict_proba(features);
        if !pos.is_finite() {
            return Err(ModelError::Inference(format!(
                "non-finite probability {pos}"
            )));
        }
        Ok(pos)
    }

    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        let [neg, pos] = self.predict_proba(features);
        Ok(u8::from(pos > neg))
    }

    fn feature_importances(&self) -> &[f64] {
        &self.forest.feature_importances
    }
}
