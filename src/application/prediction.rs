//! Prediction service: Screens one blood-count panel.
//!
//! This service coordinates:
//! - Positional argument parsing and validation
//! - Index derivation
//! - Model loading and probability lookup
//! - Combination with the iron rule cascade

use std::path::PathBuf;

use crate::adapters::ForestModel;
use crate::config::Settings;
use crate::domain::{
    DerivedIndices, FeatureVector, Gender, IronAssessment, PatientObservation, PredictionVerdict,
};
use crate::ports::{ModelError, ProbabilityModel};
use crate::HemascreenError;

/// Number of positional inputs, in order: age, gender, hb, mcv, mch, rdw,
/// rbc, fatigue frequency, family relation, jaundice, splenomegaly.
pub const ARG_COUNT: usize = 11;

/// Service for screening a single patient.
pub struct PredictionService {
    model_path: PathBuf,
    require_manifest: bool,
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, HemascreenError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| HemascreenError::Input(format!("Invalid value for {name}: {raw:?}")))
}

impl PredictionService {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            model_path: settings.model_path.clone(),
            require_manifest: settings.require_manifest,
        }
    }

    /// Parse the positional arguments into an observation.
    ///
    /// Arguments past the eleventh are ignored.
    ///
    /// # Errors
    /// Returns `HemascreenError::Input` for too few arguments, a value that
    /// does not parse, or a negative / non-finite lab value.
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<PatientObservation, HemascreenError> {
        if args.len() < ARG_COUNT {
            return Err(HemascreenError::Input("Missing input arguments".into()));
        }
        let arg = |i: usize| args[i].as_ref();

        let observation = PatientObservation {
            age: parse_field("age", arg(0))?,
            gender: Gender::parse(arg(1)),
            hb: parse_field("hb", arg(2))?,
            mcv: parse_field("mcv", arg(3))?,
            mch: parse_field("mch", arg(4))?,
            rdw: parse_field("rdw", arg(5))?,
            rbc: parse_field("rbc", arg(6))?,
            fatigue_frequency: parse_field("fatigue frequency", arg(7))?,
            family_relation: parse_field("family relation", arg(8))?,
            jaundice: parse_field("jaundice", arg(9))?,
            spleen_or_cholelithiasis: parse_field("splenomegaly or cholelithiasis", arg(10))?,
        };

        observation
            .validate()
            .map_err(|errors| HemascreenError::Input(errors.join("; ")))?;

        Ok(observation)
    }

    /// Full pipeline: parse, derive, load the model and combine.
    ///
    /// # Errors
    /// - `HemascreenError::Input` for bad arguments
    /// - `HemascreenError::ArtifactMissing` if the model file is absent
    /// - `HemascreenError::Model` / `Runtime` if loading or inference fails
    pub fn predict<S: AsRef<str>>(&self, args: &[S]) -> Result<PredictionVerdict, HemascreenError> {
        let observation = Self::parse_args(args)?;

        if !self.model_path.is_file() {
            tracing::error!("Model artifact missing at {:?}", self.model_path);
            return Err(HemascreenError::ArtifactMissing("Model file not found!".into()));
        }

        let model = ForestModel::load(&self.model_path, self.require_manifest).map_err(|e| match e {
            ModelError::NotFound(_) => HemascreenError::ArtifactMissing("Model file not found!".into()),
            other => HemascreenError::Model(other),
        })?;

        Self::predict_with_model(&observation, &model)
    }

    /// Screen an already-parsed observation against any model.
    ///
    /// # Errors
    /// Returns `HemascreenError::Model` if inference fails, or
    /// `HemascreenError::Runtime` if the probability is outside [0, 1].
    pub fn predict_with_model(
        observation: &PatientObservation,
        model: &dyn ProbabilityModel,
    ) -> Result<PredictionVerdict, HemascreenError> {
        let indices = DerivedIndices::from_observation(observation);
        if !indices.mentzer_defined || !indices.green_king_defined {
            tracing::warn!(
                "Index undefined for zero denominator (mentzer_defined={}, green_king_defined={})",
                indices.mentzer_defined,
                indices.green_king_defined
            );
        }

        let features = FeatureVector::new(observation, &indices);
        let probability = model.predict_probability(&features)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(HemascreenError::Runtime(format!(
                "Model returned probability {probability} outside [0, 1]"
            )));
        }

        let iron = IronAssessment::assess(observation, &indices);
        let verdict = PredictionVerdict::combine(&indices, &iron, probability);

        tracing::info!(
            "Screening complete: thalassemia={}, iron={} (pathway={:?}, gender={})",
            verdict.thalassemia,
            verdict.iron,
            iron.pathway,
            observation.gender
        );

        Ok(verdict)
    }
}
