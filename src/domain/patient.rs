//! Patient blood-count panel and the classifier feature vector.
//!
//! The feature order and naming below is the training-time contract of the
//! thalassemia model and must not be reordered.

use serde::{Deserialize, Serialize};

use super::indices::DerivedIndices;

/// Number of features the thalassemia model consumes.
pub const FEATURE_COUNT: usize = 11;

/// Feature names in training order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Hb",
    "MCV",
    "MCH",
    "RDW",
    "RBC",
    "Fatigue Frequency",
    "Family Relation",
    "Jaundice",
    "Splenomegaly or Cholelithiasis",
    "Mentzer Index",
    "Green King Index",
];

/// Patient gender as it affects the adult hemoglobin reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    /// Parse a free-form gender token, case-insensitively.
    ///
    /// Anything other than `male` or `female` is `Unspecified`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Unspecified,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// One patient's blood-count panel plus the categorical history flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientObservation {
    /// Age in whole years
    pub age: u32,

    pub gender: Gender,

    /// Hemoglobin in g/dL
    pub hb: f64,

    /// Mean corpuscular volume in fL
    pub mcv: f64,

    /// Mean corpuscular hemoglobin in pg
    pub mch: f64,

    /// Red cell distribution width in %
    pub rdw: f64,

    /// Red blood cell count in 10^6/uL
    pub rbc: f64,

    /// Ordinal-encoded fatigue frequency
    pub fatigue_frequency: u32,

    /// Ordinal-encoded family relation (consanguinity / affected relative)
    pub family_relation: u32,

    /// Jaundice history flag
    pub jaundice: u32,

    /// Splenomegaly or cholelithiasis flag
    pub spleen_or_cholelithiasis: u32,
}

impl PatientObservation {
    /// Validate that every lab value is a finite, non-negative number.
    ///
    /// Zero is accepted: the derived indices treat a zero denominator as
    /// "undefined" rather than as an error.
    ///
    /// # Errors
    /// Returns every violation found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("hb", self.hb),
            ("mcv", self.mcv),
            ("mch", self.mch),
            ("rdw", self.rdw),
            ("rbc", self.rbc),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name} must be a finite number, got {value}"));
            } else if value < 0.0 {
                errors.push(format!("{name} {value} must not be negative"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Ordered model input. Field order matches [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureVector {
    pub hb: f64,
    pub mcv: f64,
    pub mch: f64,
    pub rdw: f64,
    pub rbc: f64,
    pub fatigue_frequency: f64,
    pub family_relation: f64,
    pub jaundice: f64,
    pub spleen_or_cholelithiasis: f64,
    pub mentzer_index: f64,
    pub green_king_index: f64,
}

impl FeatureVector {
    /// Assemble the model input from an observation and its derived indices.
    #[must_use]
    pub fn new(observation: &PatientObservation, indices: &DerivedIndices) -> Self {
        Self {
            hb: observation.hb,
            mcv: observation.mcv,
            mch: observation.mch,
            rdw: observation.rdw,
            rbc: observation.rbc,
            fatigue_frequency: f64::from(observation.fatigue_frequency),
            family_relation: f64::from(observation.family_relation),
            jaundice: f64::from(observation.jaundice),
            spleen_or_cholelithiasis: f64::from(observation.spleen_or_cholelithiasis),
            mentzer_index: indices.mentzer_index,
            green_king_index: indices.green_king_index,
        }
    }

    /// Values in training order.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.hb,
            self.mcv,
            self.mch,
            self.rdw,
            self.rbc,
            self.fatigue_frequency,
            self.family_relation,
            self.jaundice,
            self.spleen_or_cholelithiasis,
            self.mentzer_index,
            self.green_king_index,
        ]
    }

    /// Build a vector from values already in training order.
    ///
    /// # Errors
    /// Returns error if the slice does not hold exactly 11 values.
    pub fn from_slice(v: &[f64]) -> Result<Self, String> {
        if v.len() != FEATURE_COUNT {
            return Err(format!(
                "Expected {FEATURE_COUNT} features, got {}",
                v.len()
            ));
        }

        Ok(Self {
            hb: v[0],
            mcv: v[1],
            mch: v[2],
            rdw: v[3],
            rbc: v[4],
            fatigue_frequency: v[5],
            family_relation: v[6],
            jaundice: v[7],
            spleen_or_cholelithiasis: v[8],
            mentzer_index: v[9],
            green_king_index: v[10],
        })
    }
}
