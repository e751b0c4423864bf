use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Probabilities are reported as whole percentages and never exceed this.
pub const MAX_REPORTED_PROBABILITY: u32 = 95;

/// Forest probabilities at or below this percentage are not reported.
pub const REPORTING_THRESHOLD_PERCENT: f64 = 15.0;

pub const DISCLAIMER: &str = "This prediction is based on medication patterns and is not a medical diagnosis. Please consult with healthcare professionals.";

// ---------------------------------------------------------------------------
// Prediction output
// ---------------------------------------------------------------------------

/// A medication that supports a predicted disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub medication: String,
    /// Days on the medication.
    pub duration: f64,
    pub adherence: f64,
    /// Minimum duration the reference table expects for this medication.
    pub typical_duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease: String,
    /// Whole percent, capped at [`MAX_REPORTED_PROBABILITY`].
    pub probability: u32,
    pub contributing_factors: Vec<ContributingFactor>,
    pub confidence_level: u32,
}

/// Full response for one prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Medication entries exactly as the client sent them.
    pub medications_analyzed: Vec<Value>,
    pub predictions: Vec<Prediction>,
    pub analysis_timestamp: String,
    pub disclaimer: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Reference data load failed ({0}): {1}")]
    Load(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    Parse(String, String),

    #[error("Invalid mapping for {medication}: {reason}")]
    InvalidMapping { medication: String, reason: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ForestError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Row count {rows} does not match label count {labels}")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("Row {index} has {found} features, expected {expected}")]
    RaggedRow {
        index: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Model not fitted yet. Call fit() first.")]
    NotFitted,

    #[error("No medications provided")]
    NoMedications,

    #[error("No training records provided")]
    NoTrainingRecords,

    #[error("Forest error: {0}")]
    Forest(#[from] ForestError),

    #[error("Reference data error: {0}")]
    Reference(#[from] ReferenceError),
}

/// Round half to even, then cap at [`MAX_REPORTED_PROBABILITY`].
pub(crate) fn cap_percentage(value: f64) -> u32 {
    let rounded = value.round_ties_even();
    if rounded <= 0.0 {
        0
    } else {
        (rounded as u32).min(MAX_REPORTED_PROBABILITY)
    }
}
