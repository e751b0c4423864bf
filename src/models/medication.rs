use serde::{Deserialize, Serialize};

/// Adherence assumed when a record does not report one.
pub const DEFAULT_ADHERENCE: f64 = 1.0;

/// One medication as reported by the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<f64>,
    /// Fraction of doses taken, 0.0–1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adherence_rate: Option<f64>,
}

impl MedicationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: None,
            duration_days: None,
            adherence_rate: None,
        }
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }

    pub fn with_duration(mut self, days: f64) -> Self {
        self.duration_days = Some(days);
        self
    }

    pub fn with_adherence(mut self, rate: f64) -> Self {
        self.adherence_rate = Some(rate);
        self
    }

    /// Days on the medication, 0 when unreported.
    pub fn duration_or_zero(&self) -> f64 {
        self.duration_days.unwrap_or(0.0)
    }

    pub fn adherence_or_default(&self) -> f64 {
        self.adherence_rate.unwrap_or(DEFAULT_ADHERENCE)
    }

    /// Lowercased, trimmed name used for table lookups.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A labelled training record: a patient's medications and known diseases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub patient_id: String,
    pub medications: Vec<MedicationRecord>,
    pub diseases: Vec<String>,
}
