//! Derived hematological indices.
//!
//! - Mentzer Index: MCV / RBC
//! - Green & King Index: MCV² × RDW / (Hb × 100)
//!
//! Both are rounded to two decimals. A zero denominator yields a 0 sentinel;
//! the `*_defined` flags record which case applied without altering the
//! value the rule cascade sees.

use serde::{Deserialize, Serialize};

use super::patient::PatientObservation;

/// Round to `decimals` places using exact decimal rounding of the binary
/// value, ties to even.
///
/// `round_to(2.675, 2)` is `2.67` because the nearest double to 2.675 lies
/// just below the midpoint.
#[must_use]
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// Indices computed from one blood-count panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedIndices {
    pub mentzer_index: f64,
    pub green_king_index: f64,

    /// False when RBC was zero and `mentzer_index` is the 0 sentinel
    #[serde(skip)]
    pub mentzer_defined: bool,

    /// False when Hb was zero and `green_king_index` is the 0 sentinel
    #[serde(skip)]
    pub green_king_defined: bool,
}

impl DerivedIndices {
    /// Compute both indices. `mch` takes no part in either formula.
    #[must_use]
    pub fn derive(hb: f64, mcv: f64, _mch: f64, rdw: f64, rbc: f64) -> Self {
        let mentzer_defined = rbc > 0.0;
        let mentzer_index = if mentzer_defined {
            round_to(mcv / rbc, 2)
        } else {
            0.0
        };

        let green_king_defined = hb > 0.0;
        let green_king_index = if green_king_defined {
            round_to((mcv * mcv * rdw) / (hb * 100.0), 2)
        } else {
            0.0
        };

        Self {
            mentzer_index,
            green_king_index,
            mentzer_defined,
            green_king_defined,
        }
    }

    #[must_use]
    pub fn from_observation(observation: &PatientObservation) -> Self {
        Self::derive(
            observation.hb,
            observation.mcv,
            observation.mch,
            observation.rdw,
            observation.rbc,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_matches_decimal_rounding() {
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.123_456_78, 4), 0.1235);
        assert_eq!(round_to(18.0, 2), 18.0);
        assert_eq!(round_to(1.0 / 3.0, 2), 0.33);
    }

    #[test]
    fn test_reference_panel() {
        let indices = DerivedIndices::derive(13.5, 90.0, 30.0, 13.0, 5.0);
        assert_eq!(indices.mentzer_index, 18.0);
        assert_eq!(indices.green_king_index, 78.0);
        assert!(indices.mentzer_defined);
        assert!(indices.green_king_defined);
    }

    #[test]
    fn test_indices_are_rounded() {
        // 80 / 6.1 = 13.114754...
        let indices = DerivedIndices::derive(11.0, 80.0, 25.0, 15.2, 6.1);
        assert_eq!(indices.mentzer_index, 13.11);
        // 6400 * 15.2 / 1100 = 88.436363...
        assert_eq!(indices.green_king_index, 88.44);
    }

    #[test]
    fn test_zero_rbc_yields_sentinel() {
        let indices = DerivedIndices::derive(13.5, 90.0, 30.0, 13.0, 0.0);
        assert_eq!(indices.mentzer_index, 0.0);
        assert!(!indices.mentzer_defined);
        assert!(indices.green_king_defined);
    }

    #[test]
    fn test_zero_hb_yields_sentinel() {
        let indices = DerivedIndices::derive(0.0, 90.0, 30.0, 13.0, 5.0);
        assert_eq!(indices.green_king_index, 0.0);
        assert!(!indices.green_king_defined);
        assert_eq!(indices.mentzer_index, 18.0);
    }

    #[test]
    fn test_computed_zero_is_defined() {
        let indices = DerivedIndices::derive(13.5, 0.0, 30.0, 13.0, 5.0);
        assert_eq!(indices.mentzer_index, 0.0);
        assert!(indices.mentzer_defined);
    }
}
