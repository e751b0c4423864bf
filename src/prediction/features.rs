//! Feature extraction and label encoding for the disease forest.

use super::reference::ReferenceData;
use crate::models::MedicationRecord;

/// Features emitted per medication.
pub const FEATURES_PER_MEDICATION: usize = 4;

/// Per-medication features, concatenated in input order:
/// years on the medication, adherence, number of mapped diseases and the
/// strongest mapped confidence. Unknown medications contribute zeros for
/// the last two.
pub fn medication_features(medications: &[MedicationRecord], reference: &ReferenceData) -> Vec<f64> {
    let mut features = Vec::with_capacity(medications.len() * FEATURES_PER_MEDICATION);
    for med in medications {
        let mapping = reference.mapping_for(&med.name);
        features.push(med.duration_or_zero() / 365.0);
        features.push(med.adherence_or_default());
        features.push(mapping.map_or(0.0, |m| m.diseases.len() as f64));
        features.push(mapping.map_or(0.0, |m| m.max_confidence()));
    }
    features
}

/// Zero-pad or truncate `features` to exactly `width` values.
pub fn fit_width(mut features: Vec<f64>, width: usize) -> Vec<f64> {
    features.resize(width, 0.0);
    features
}

/// Encodes label sets as 0/1 rows over a sorted class list.
#[derive(Debug, Clone, Default)]
pub struct LabelBinarizer {
    classes: Vec<String>,
}

impl LabelBinarizer {
    pub fn fit(label_sets: &[Vec<String>]) -> Self {
        let mut classes: Vec<String> = label_sets.iter().flatten().cloned().collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, label_sets: &[Vec<String>]) -> Vec<Vec<bool>> {
        label_sets
            .iter()
            .map(|labels| {
                self.classes
                    .iter()
                    .map(|class| labels.iter().any(|l| l == class))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_for_known_medication() {
        let reference = ReferenceData::builtin();
        let meds = vec![MedicationRecord::new("Lisinopril")
            .with_duration(365.0)
            .with_adherence(0.5)];
        assert_eq!(medication_features(&meds, &reference), vec![1.0, 0.5, 2.0, 0.9]);
    }

    #[test]
    fn features_for_unknown_medication_use_defaults() {
        let reference = ReferenceData::builtin();
        let meds = vec![MedicationRecord::new("Ibuprofen")];
        assert_eq!(medication_features(&meds, &reference), vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn features_concatenate_in_order() {
        let reference = ReferenceData::builtin();
        let meds = vec![
            MedicationRecord::new("Metformin"),
            MedicationRecord::new("Atorvastatin"),
        ];
        let features = medication_features(&meds, &reference);
        assert_eq!(features.len(), 8);
        assert_eq!(features[3], 0.85);
        assert_eq!(features[7], 0.88);
    }

    #[test]
    fn fit_width_pads_and_truncates() {
        assert_eq!(fit_width(vec![1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(fit_width(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    }

    #[test]
    fn binarizer_sorts_and_dedups_classes() {
        let sets = vec![
            vec!["Hypertension".to_string(), "Type 2 Diabetes".to_string()],
            vec!["Hypercholesterolemia".to_string(), "Hypertension".to_string()],
        ];
        let binarizer = LabelBinarizer::fit(&sets);
        assert_eq!(
            binarizer.classes(),
            &["Hypercholesterolemia", "Hypertension", "Type 2 Diabetes"]
        );
        assert_eq!(
            binarizer.transform(&sets),
            vec![vec![false, true, true], vec![true, true, false]]
        );
    }
}
