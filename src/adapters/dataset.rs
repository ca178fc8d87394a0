//! Labeled test-set loader.
//!
//! Reads a comma-separated file with a header row. The `Prediction` column
//! holds the 0/1 ground truth; feature columns are matched to the model's
//! training names by header, so their order in the file does not matter.
//! Extra columns are ignored.

use std::fs;
use std::path::Path;

use crate::domain::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Ground-truth column name.
pub const LABEL_COLUMN: &str = "Prediction";

/// Error type for test-set loading.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Test data file not found: {0}")]
    NotFound(String),

    #[error("Failed to read test data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Test data contains no rows")]
    Empty,

    #[error("Test data is missing column {0:?}")]
    MissingColumn(String),

    #[error("Test data row {row}: {message}")]
    Row { row: usize, message: String },
}

/// Feature vectors with their ground-truth labels, in file order.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<u8>,
}

fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_start_matches('\u{feff}').trim_matches('"').trim()
}

impl LabeledDataset {
    /// Load the test set from `path`.
    ///
    /// # Errors
    /// Returns `DatasetError::NotFound` if the file is absent, otherwise any
    /// parse error from [`LabeledDataset::parse`].
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        if !path.is_file() {
            return Err(DatasetError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let dataset = Self::parse(&content)?;
        tracing::info!("Loaded {} test rows from {:?}", dataset.len(), path);
        Ok(dataset)
    }

    /// Parse CSV text.
    ///
    /// # Errors
    /// Returns an error for a missing header column, a ragged row, a
    /// non-numeric cell, a label other than 0/1, or a file with no data rows.
    pub fn parse(content: &str) -> Result<Self, DatasetError> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(DatasetError::Empty)?;
        let columns: Vec<&str> = header.split(',').map(clean_cell).collect();

        let find = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let label_idx = find(LABEL_COLUMN)?;
        let mut feature_idx = [0usize; FEATURE_COUNT];
        for (slot, name) in feature_idx.iter_mut().zip(FEATURE_NAMES.iter()) {
            *slot = find(name)?;
        }

        let mut dataset = Self::default();
        for (line_no, line) in lines {
            let row = line_no + 1;
            let cells: Vec<&str> = line.split(',').map(clean_cell).collect();
            if cells.len() != columns.len() {
                return Err(DatasetError::Row {
                    row,
                    message: format!("expected {} cells, got {}", columns.len(), cells.len()),
                });
            }

            let parse_cell = |idx: usize| {
                cells[idx].parse::<f64>().map_err(|_| DatasetError::Row {
                    row,
                    message: format!("column {:?}: {:?} is not a number", columns[idx], cells[idx]),
                })
            };

            let mut values = [0.0_f64; FEATURE_COUNT];
            for (value, &idx) in values.iter_mut().zip(feature_idx.iter()) {
                *value = parse_cell(idx)?;
            }

            let label = match parse_cell(label_idx)? {
                l if l == 0.0 => 0,
                l if l == 1.0 => 1,
                other => {
                    return Err(DatasetError::Row {
                        row,
                        message: format!("label {other} is not 0 or 1"),
                    })
                }
            };

            let features = FeatureVector::from_slice(&values)
                .map_err(|message| DatasetError::Row { row, message })?;
            dataset.features.push(features);
            dataset.labels.push(label);
        }

        if dataset.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(dataset)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
