//! Screening verdicts.
//!
//! Two independent decision policies:
//! - Thalassemia Minor: fixed cut-points on the model probability
//! - Iron Deficiency: nested threshold cascade over Mentzer Index, RDW, Hb, MCH, MCV

use serde::{Deserialize, Serialize};

use super::indices::{round_to, DerivedIndices};
use super::patient::{Gender, PatientObservation};

/// Probability at or above which the panel is reported as Thalassemia Minor.
pub const THALASSEMIA_CUTOFF: f64 = 0.80;

/// Probability at or above which the panel is reported as likely Thalassemia Minor.
pub const LIKELY_THALASSEMIA_CUTOFF: f64 = 0.55;

/// Mentzer Index above which the iron cascade is evaluated.
pub const MENTZER_CUTOFF: f64 = 13.0;

/// RDW (%) above which the elevated-RDW branch applies.
pub const RDW_CUTOFF: f64 = 14.5;

/// Display color attached to each verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityColor {
    Red,
    Orange,
    Green,
}

impl std::fmt::Display for SeverityColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Orange => write!(f, "orange"),
            Self::Green => write!(f, "green"),
        }
    }
}

/// Thalassemia Minor screening band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThalassemiaStatus {
    #[serde(rename = "Thalassemia Minor")]
    Positive,
    #[serde(rename = "Likely Thalassemia Minor")]
    Likely,
    #[serde(rename = "Normal Healthy")]
    Normal,
}

impl ThalassemiaStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "Thalassemia Minor",
            Self::Likely => "Likely Thalassemia Minor",
            Self::Normal => "Normal Healthy",
        }
    }

    #[must_use]
    pub fn color(&self) -> SeverityColor {
        match self {
            Self::Positive => SeverityColor::Red,
            Self::Likely => SeverityColor::Orange,
            Self::Normal => SeverityColor::Green,
        }
    }
}

impl std::fmt::Display for ThalassemiaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Iron Deficiency screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IronStatus {
    #[serde(rename = "Iron Deficiency Positive")]
    Positive,
    #[serde(rename = "No Iron Deficiency")]
    Negative,
}

impl IronStatus {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "Iron Deficiency Positive",
            Self::Negative => "No Iron Deficiency",
        }
    }

    #[must_use]
    pub fn color(&self) -> SeverityColor {
        match self {
            Self::Positive => SeverityColor::Red,
            Self::Negative => SeverityColor::Green,
        }
    }
}

impl std::fmt::Display for IronStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Band a positive-class probability. Lower bounds are inclusive.
#[must_use]
pub fn classify_thalassemia(probability: f64) -> ThalassemiaStatus {
    if probability >= THALASSEMIA_CUTOFF {
        ThalassemiaStatus::Positive
    } else if probability >= LIKELY_THALASSEMIA_CUTOFF {
        ThalassemiaStatus::Likely
    } else {
        ThalassemiaStatus::Normal
    }
}

/// Hemoglobin reference value (g/dL) for the patient's age and gender.
///
/// Children under 15 use the pediatric value regardless of gender.
#[must_use]
pub fn hb_threshold(age: u32, gender: Gender) -> f64 {
    if age >= 15 {
        if gender == Gender::Male {
            13.0
        } else {
            12.0
        }
    } else {
        11.5
    }
}

/// Which branch of the iron cascade decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IronPathway {
    /// Mentzer Index <= 13: cascade skipped
    MentzerAtOrBelowCutoff,
    /// Mentzer Index > 13 and RDW > 14.5
    ElevatedRdw,
    /// Mentzer Index > 13 and RDW <= 14.5
    NormalRdw,
}

/// Outcome of the iron cascade with the facts that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IronAssessment {
    pub status: IronStatus,
    pub pathway: IronPathway,
    pub hb_threshold: f64,
}

impl IronAssessment {
    /// Run the cascade on an observation and its derived indices.
    #[must_use]
    pub fn assess(observation: &PatientObservation, indices: &DerivedIndices) -> Self {
        classify_iron(
            observation.age,
            observation.gender,
            observation.hb,
            observation.mcv,
            observation.mch,
            observation.rdw,
            indices.mentzer_index,
        )
    }
}

/// Run the Iron Deficiency decision tree.
#[must_use]
pub fn classify_iron(
    age: u32,
    gender: Gender,
    hb: f64,
    mcv: f64,
    mch: f64,
    rdw: f64,
    mentzer_index: f64,
) -> IronAssessment {
    let hb_threshold = hb_threshold(age, gender);

    let (pathway, positive) = if mentzer_index > MENTZER_CUTOFF {
        if rdw > RDW_CUTOFF {
            (IronPathway::ElevatedRdw, hb < hb_threshold || mch < 26.0)
        } else {
            (
                IronPathway::NormalRdw,
                hb >= hb_threshold && (mch < 24.0 || mcv < 78.0),
            )
        }
    } else {
        (IronPathway::MentzerAtOrBelowCutoff, false)
    };

    IronAssessment {
        status: if positive {
            IronStatus::Positive
        } else {
            IronStatus::Negative
        },
        pathway,
        hb_threshold,
    }
}

/// Final screening result for one panel.
///
/// Serialized field names are the contract consumed by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionVerdict {
    pub thalassemia: ThalassemiaStatus,

    #[serde(rename = "thalColor")]
    pub thalassemia_color: SeverityColor,

    pub iron: IronStatus,

    #[serde(rename = "ironColor")]
    pub iron_color: SeverityColor,

    /// Model probability, rounded to 4 decimals
    pub probability: f64,

    #[serde(rename = "mentzer")]
    pub mentzer_index: f64,

    #[serde(rename = "greenKing")]
    pub green_king_index: f64,
}

impl PredictionVerdict {
    /// Combine a model probability with an iron assessment already made for
    /// the same observation.
    ///
    /// `probability` must already be validated to lie in [0, 1].
    #[must_use]
    pub fn combine(indices: &DerivedIndices, iron: &IronAssessment, probability: f64) -> Self {
        let thalassemia = classify_thalassemia(probability);

        Self {
            thalassemia,
            thalassemia_color: thalassemia.color(),
            iron: iron.status,
            iron_color: iron.status.color(),
            probability: round_to(probability, 4),
            mentzer_index: indices.mentzer_index,
            green_king_index: indices.green_king_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_patient() -> PatientObservation {
        PatientObservation {
            age: 30,
            gender: Gender::Male,
            hb: 13.5,
            mcv: 90.0,
            mch: 30.0,
            rdw: 13.0,
            rbc: 5.0,
            fatigue_frequency: 1,
            family_relation: 0,
            jaundice: 0,
            spleen_or_cholelithiasis: 0,
        }
    }

    #[test]
    fn test_thalassemia_bands() {
        assert_eq!(classify_thalassemia(1.0), ThalassemiaStatus::Positive);
        assert_eq!(classify_thalassemia(0.80), ThalassemiaStatus::Positive);
        assert_eq!(classify_thalassemia(0.7999), ThalassemiaStatus::Likely);
        assert_eq!(classify_thalassemia(0.55), ThalassemiaStatus::Likely);
        assert_eq!(classify_thalassemia(0.5499), ThalassemiaStatus::Normal);
        assert_eq!(classify_thalassemia(0.0), ThalassemiaStatus::Normal);
    }

    #[test]
    fn test_thalassemia_colors() {
        assert_eq!(ThalassemiaStatus::Positive.color(), SeverityColor::Red);
        assert_eq!(ThalassemiaStatus::Likely.color(), SeverityColor::Orange);
        assert_eq!(ThalassemiaStatus::Normal.color(), SeverityColor::Green);
    }

    #[test]
    fn test_bands_partition_unit_interval() {
        for i in 0..=1000 {
            let p = f64::from(i) / 1000.0;
            let expected = if p >= 0.80 {
                ThalassemiaStatus::Positive
            } else if p >= 0.55 {
                ThalassemiaStatus::Likely
            } else {
                ThalassemiaStatus::Normal
            };
            assert_eq!(classify_thalassemia(p), expected, "p = {p}");
        }
    }

    #[test]
    fn test_hb_threshold_selection() {
        assert_eq!(hb_threshold(14, Gender::Male), 11.5);
        assert_eq!(hb_threshold(14, Gender::Female), 11.5);
        assert_eq!(hb_threshold(15, Gender::parse("Male")), 13.0);
        assert_eq!(hb_threshold(15, Gender::parse("MALE")), 13.0);
        assert_eq!(hb_threshold(15, Gender::parse("Female")), 12.0);
        assert_eq!(hb_threshold(40, Gender::Unspecified), 12.0);
    }

    #[test]
    fn test_mentzer_cutoff_is_exclusive() {
        // Would be positive through the elevated-RDW branch if evaluated.
        let at_cutoff = classify_iron(30, Gender::Male, 10.0, 70.0, 20.0, 16.0, 13.0);
        assert_eq!(at_cutoff.status, IronStatus::Negative);
        assert_eq!(at_cutoff.pathway, IronPathway::MentzerAtOrBelowCutoff);

        let above = classify_iron(30, Gender::Male, 10.0, 70.0, 20.0, 16.0, 13.01);
        assert_eq!(above.status, IronStatus::Positive);
        assert_eq!(above.pathway, IronPathway::ElevatedRdw);
    }

    #[test]
    fn test_rdw_cutoff_takes_normal_branch() {
        // hb below threshold would trigger the elevated branch, not the normal one.
        let at_cutoff = classify_iron(30, Gender::Male, 12.0, 90.0, 25.0, 14.5, 18.0);
        assert_eq!(at_cutoff.pathway, IronPathway::NormalRdw);
        assert_eq!(at_cutoff.status, IronStatus::Negative);

        let above = classify_iron(30, Gender::Male, 12.0, 90.0, 25.0, 14.51, 18.0);
        assert_eq!(above.pathway, IronPathway::ElevatedRdw);
        assert_eq!(above.status, IronStatus::Positive);
    }

    #[test]
    fn test_elevated_rdw_branch() {
        // mch < 26 alone is enough.
        let low_mch = classify_iron(30, Gender::Female, 13.0, 80.0, 25.9, 15.0, 15.0);
        assert_eq!(low_mch.status, IronStatus::Positive);

        // hb < threshold alone is enough.
        let low_hb = classify_iron(30, Gender::Female, 11.9, 80.0, 27.0, 15.0, 15.0);
        assert_eq!(low_hb.status, IronStatus::Positive);

        let neither = classify_iron(30, Gender::Female, 12.0, 80.0, 26.0, 15.0, 15.0);
        assert_eq!(neither.status, IronStatus::Negative);
    }

    #[test]
    fn test_normal_rdw_branch() {
        // hb meets threshold and mcv < 78.
        let low_mcv = classify_iron(10, Gender::Male, 11.5, 77.9, 27.0, 13.0, 15.0);
        assert_eq!(low_mcv.status, IronStatus::Positive);
        assert_eq!(low_mcv.hb_threshold, 11.5);

        // hb below threshold blocks the branch even with low mch.
        let low_hb = classify_iron(10, Gender::Male, 11.4, 77.9, 20.0, 13.0, 15.0);
        assert_eq!(low_hb.status, IronStatus::Negative);

        let mch_at_cutoff = classify_iron(30, Gender::Male, 14.0, 80.0, 24.0, 13.0, 15.0);
        assert_eq!(mch_at_cutoff.status, IronStatus::Negative);
    }

    #[test]
    fn test_reference_patient_no_iron_deficiency() {
        let patient = reference_patient();
        let indices = DerivedIndices::from_observation(&patient);
        let iron = IronAssessment::assess(&patient, &indices);
        let verdict = PredictionVerdict::combine(&indices, &iron, 0.1234);

        assert_eq!(verdict.mentzer_index, 18.0);
        assert_eq!(verdict.iron, IronStatus::Negative);
        assert_eq!(verdict.iron_color, SeverityColor::Green);
        assert_eq!(verdict.thalassemia, ThalassemiaStatus::Normal);
    }

    #[test]
    fn test_reference_patient_low_mch_is_iron_positive() {
        let patient = PatientObservation {
            mch: 20.0,
            ..reference_patient()
        };
        let indices = DerivedIndices::from_observation(&patient);
        let iron = IronAssessment::assess(&patient, &indices);
        let verdict = PredictionVerdict::combine(&indices, &iron, 0.9);

        assert_eq!(verdict.iron, IronStatus::Positive);
        assert_eq!(verdict.iron_color, SeverityColor::Red);
        assert_eq!(verdict.thalassemia, ThalassemiaStatus::Positive);
        assert_eq!(verdict.thalassemia_color, SeverityColor::Red);
    }

    #[test]
    fn test_verdict_wire_format() {
        let patient = reference_patient();
        let indices = DerivedIndices::from_observation(&patient);
        let iron = IronAssessment::assess(&patient, &indices);
        let verdict = PredictionVerdict::combine(&indices, &iron, 0.612_345);

        let json = serde_json::to_value(verdict).expect("Should serialize");
        assert_eq!(json["thalassemia"], "Likely Thalassemia Minor");
        assert_eq!(json["thalColor"], "orange");
        assert_eq!(json["iron"], "No Iron Deficiency");
        assert_eq!(json["ironColor"], "green");
        assert_eq!(json["probability"], 0.6123);
        assert_eq!(json["mentzer"], 18.0);
        assert_eq!(json["greenKing"], 78.0);
        assert_eq!(json.as_object().map(|o| o.len()), Some(7));
    }

    #[test]
    fn test_verdict_takes_iron_from_assessment() {
        let patient = reference_patient();
        let indices = DerivedIndices::from_observation(&patient);
        let iron = IronAssessment {
            status: IronStatus::Positive,
            pathway: IronPathway::ElevatedRdw,
            hb_threshold: 13.0,
        };
        let verdict = PredictionVerdict::combine(&indices, &iron, 0.2);

        assert_eq!(verdict.iron, IronStatus::Positive);
        assert_eq!(verdict.iron_color, SeverityColor::Red);
        assert_eq!(verdict.thalassemia, ThalassemiaStatus::Normal);
    }

    #[test]
    fn test_assess_uses_observation_and_mentzer() {
        let patient = PatientObservation {
            mch: 20.0,
            ..reference_patient()
        };
        let indices = DerivedIndices::from_observation(&patient);
        let iron = IronAssessment::assess(&patient, &indices);

        assert_eq!(iron.pathway, IronPathway::NormalRdw);
        assert_eq!(iron.status, IronStatus::Positive);
        assert_eq!(iron.hb_threshold, 13.0);
    }
}
