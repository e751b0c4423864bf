use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::ReferenceError;
use crate::models::{normalize_name, MedicationRecord, SampleRecord};

const MAPPINGS_FILE: &str = "disease_mappings.json";
const SAMPLES_FILE: &str = "sample_records.json";

/// Candidate diseases for one medication with fixed confidence scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseMapping {
    pub medication: String,
    pub diseases: Vec<String>,
    /// Parallel to `diseases`.
    pub confidence_scores: Vec<f64>,
    pub min_duration_days: u32,
    pub typical_dosages: Vec<String>,
}

impl DiseaseMapping {
    /// Confidence score for `disease`, if this medication maps to it.
    pub fn confidence_for(&self, disease: &str) -> Option<f64> {
        self.diseases
            .iter()
            .position(|d| d == disease)
            .and_then(|idx| self.confidence_scores.get(idx).copied())
    }

    pub fn max_confidence(&self) -> f64 {
        self.confidence_scores.iter().copied().fold(0.0, f64::max)
    }

    /// `(disease, confidence)` pairs in table order.
    pub fn scored_diseases(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.diseases
            .iter()
            .map(String::as_str)
            .zip(self.confidence_scores.iter().copied())
    }
}

/// Medication → disease table plus the labelled records the forest trains on.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub mappings: Vec<DiseaseMapping>,
    pub samples: Vec<SampleRecord>,
}

impl ReferenceData {
    /// Bundled reference data.
    pub fn builtin() -> Self {
        Self {
            mappings: vec![
                DiseaseMapping {
                    medication: "Lisinopril".into(),
                    diseases: vec!["Hypertension".into(), "Heart Failure".into()],
                    confidence_scores: vec![0.9, 0.7],
                    min_duration_days: 30,
                    typical_dosages: vec!["5mg".into(), "10mg".into(), "20mg".into()],
                },
                DiseaseMapping {
                    medication: "Metformin".into(),
                    diseases: vec!["Type 2 Diabetes".into(), "Prediabetes".into()],
                    confidence_scores: vec![0.85, 0.65],
                    min_duration_days: 60,
                    typical_dosages: vec!["500mg".into(), "1000mg".into()],
                },
                DiseaseMapping {
                    medication: "Atorvastatin".into(),
                    diseases: vec![
                        "Hypercholesterolemia".into(),
                        "Cardiovascular Disease".into(),
                    ],
                    confidence_scores: vec![0.88, 0.75],
                    min_duration_days: 90,
                    typical_dosages: vec!["10mg".into(), "20mg".into(), "40mg".into()],
                },
            ],
            samples: vec![
                SampleRecord {
                    patient_id: "P001".into(),
                    medications: vec![
                        MedicationRecord::new("Lisinopril")
                            .with_dosage("10mg")
                            .with_duration(180.0)
                            .with_adherence(0.95),
                        MedicationRecord::new("Metformin")
                            .with_dosage("500mg")
                            .with_duration(365.0)
                            .with_adherence(0.88),
                    ],
                    diseases: vec!["Hypertension".into(), "Type 2 Diabetes".into()],
                },
                SampleRecord {
                    patient_id: "P002".into(),
                    medications: vec![MedicationRecord::new("Atorvastatin")
                        .with_dosage("20mg")
                        .with_duration(240.0)
                        .with_adherence(0.92)],
                    diseases: vec!["Hypercholesterolemia".into()],
                },
            ],
        }
    }

    /// Load reference data from `disease_mappings.json` and
    /// `sample_records.json` in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ReferenceError> {
        let mappings: Vec<DiseaseMapping> = read_json(dir, MAPPINGS_FILE)?;
        let samples: Vec<SampleRecord> = read_json(dir, SAMPLES_FILE)?;

        let data = Self { mappings, samples };
        data.validate()?;

        tracing::info!(
            dir = %dir.display(),
            mappings = data.mappings.len(),
            samples = data.samples.len(),
            "Loaded reference data"
        );
        Ok(data)
    }

    /// Check every mapping has one score per disease and a usable duration.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        for mapping in &self.mappings {
            let invalid = |reason: String| ReferenceError::InvalidMapping {
                medication: mapping.medication.clone(),
                reason,
            };
            if mapping.diseases.len() != mapping.confidence_scores.len() {
                return Err(invalid(format!(
                    "{} diseases but {} confidence scores",
                    mapping.diseases.len(),
                    mapping.confidence_scores.len()
                )));
            }
            if mapping.min_duration_days == 0 {
                return Err(invalid("min_duration_days must be positive".into()));
            }
            if let Some(score) = mapping
                .confidence_scores
                .iter()
                .find(|s| !(0.0..=1.0).contains(*s))
            {
                return Err(invalid(format!("confidence score {score} outside 0..=1")));
            }
        }
        Ok(())
    }

    /// Case-insensitive mapping lookup.
    pub fn mapping_for(&self, medication: &str) -> Option<&DiseaseMapping> {
        let wanted = normalize_name(medication);
        self.mappings
            .iter()
            .find(|m| normalize_name(&m.medication) == wanted)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ReferenceError> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| ReferenceError::Load(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| ReferenceError::Parse(file.into(), e.to_string()))
}
