//! Medication information catalog.
//!
//! Static monographs for the medications the service knows about, served
//! by `GET /api/medication_info/:medication`.

use serde::{Deserialize, Serialize};

use crate::models::normalize_name;

/// Monograph for a single medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationInfo {
    pub name: String,
    pub drug_class: String,
    pub common_uses: Vec<String>,
    pub side_effects: Vec<String>,
    pub precautions: Vec<String>,
    pub typical_dosages: Vec<String>,
    pub monitoring_requirements: Vec<String>,
    pub interactions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub struct MedicationCatalog {
    entries: Vec<MedicationInfo>,
}

impl MedicationCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                MedicationInfo {
                    name: "Lisinopril".into(),
                    drug_class: "ACE Inhibitor".into(),
                    common_uses: strings(&["Hypertension", "Heart Failure", "Post-Heart Attack"]),
                    side_effects: strings(&["Dry cough", "Dizziness", "Headache", "Fatigue"]),
                    precautions: strings(&[
                        "Monitor kidney function",
                        "Avoid potassium supplements",
                    ]),
                    typical_dosages: strings(&["5mg", "10mg", "20mg"]),
                    monitoring_requirements: strings(&[
                        "Blood pressure",
                        "Kidney function",
                        "Potassium levels",
                    ]),
                    interactions: strings(&["NSAIDs", "Potassium supplements", "Lithium"]),
                },
                MedicationInfo {
                    name: "Metformin".into(),
                    drug_class: "Biguanide".into(),
                    common_uses: strings(&["Type 2 Diabetes", "Insulin Resistance", "PCOS"]),
                    side_effects: strings(&[
                        "Nausea",
                        "Diarrhea",
                        "Abdominal discomfort",
                        "Vitamin B12 deficiency",
                    ]),
                    precautions: strings(&[
                        "Monitor kidney function",
                        "Temporarily stop before procedures with contrast dye",
                    ]),
                    typical_dosages: strings(&["500mg", "850mg", "1000mg"]),
                    monitoring_requirements: strings(&[
                        "Blood glucose",
                        "Kidney function",
                        "Vitamin B12 levels",
                    ]),
                    interactions: strings(&[
                        "Alcohol",
                        "Contrast dyes",
                        "Certain diabetes medications",
                    ]),
                },
                MedicationInfo {
                    name: "Atorvastatin".into(),
                    drug_class: "Statin".into(),
                    common_uses: strings(&[
                        "High Cholesterol",
                        "Cardiovascular Disease Prevention",
                    ]),
                    side_effects: strings(&[
                        "Muscle pain",
                        "Liver enzyme elevation",
                        "Digestive problems",
                    ]),
                    precautions: strings(&[
                        "Monitor liver function",
                        "Report unexplained muscle pain",
                    ]),
                    typical_dosages: strings(&["10mg", "20mg", "40mg", "80mg"]),
                    monitoring_requirements: strings(&[
                        "Liver function",
                        "Cholesterol levels",
                        "Muscle symptoms",
                    ]),
                    interactions: strings(&[
                        "Grapefruit juice",
                        "Certain antibiotics",
                        "Other cholesterol medications",
                    ]),
                },
            ],
        }
    }

    /// Case-insensitive lookup by medication name.
    pub fn lookup(&self, name: &str) -> Option<&MedicationInfo> {
        let wanted = normalize_name(name);
        self.entries.iter().find(|e| normalize_name(&e.name) == wanted)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}
