//! Binary classification quality metrics for the thalassemia model.
//!
//! Class 1 (thalassemia) is the positive class. Ratios with a zero
//! denominator are reported as 0.

use serde::{Deserialize, Serialize};

use super::indices::round_to;

/// 2x2 confusion matrix for labels [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Tally paired ground-truth and predicted labels.
    ///
    /// Any non-zero label counts as the positive class.
    #[must_use]
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            match (t != 0, p != 0) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        cm
    }

    /// Rows are true labels, columns predicted labels: `[[tn, fp], [fn, tp]]`.
    #[must_use]
    pub fn to_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    #[must_use]
    pub fn max_cell(&self) -> usize {
        self.to_rows().iter().flatten().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }

    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    #[must_use]
    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Headline metrics, each rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl From<&ConfusionMatrix> for ClassificationMetrics {
    fn from(cm: &ConfusionMatrix) -> Self {
        Self {
            accuracy: round_to(cm.accuracy(), 2),
            precision: round_to(cm.precision(), 2),
            recall: round_to(cm.recall(), 2),
            f1: round_to(cm.f1(), 2),
        }
    }
}
