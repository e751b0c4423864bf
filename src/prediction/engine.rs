use std::sync::Arc;

use serde_json::Value;

use super::features::{fit_width, medication_features, LabelBinarizer, FEATURES_PER_MEDICATION};
use super::forest::{ForestParams, RandomForest};
use super::reference::ReferenceData;
use super::types::{
    cap_percentage, ContributingFactor, Prediction, PredictionError, PredictionReport,
    DISCLAIMER, REPORTING_THRESHOLD_PERCENT,
};
use crate::models::{MedicationRecord, SampleRecord};

/// Duration scaling never boosts a probability by more than this factor.
const MAX_DURATION_FACTOR: f64 = 1.5;

struct FittedState {
    forest: RandomForest,
    binarizer: LabelBinarizer,
    /// Feature vector width; inputs are padded or truncated to it.
    width: usize,
}

/// Random-forest disease predictor refined with the reference table.
pub struct DiseasePredictionModel {
    reference: Arc<ReferenceData>,
    params: ForestParams,
    fitted: Option<FittedState>,
}

impl DiseasePredictionModel {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self::with_params(reference, ForestParams::default())
    }

    pub fn with_params(reference: Arc<ReferenceData>, params: ForestParams) -> Self {
        Self {
            reference,
            params,
            fitted: None,
        }
    }

    /// Build a model and fit it on the reference data's own samples.
    pub fn trained(reference: Arc<ReferenceData>) -> Result<Self, PredictionError> {
        let samples = reference.samples.clone();
        let mut model = Self::new(reference);
        model.fit(&samples)?;
        Ok(model)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Disease classes the forest was trained on, sorted.
    pub fn classes(&self) -> &[String] {
        self.fitted
            .as_ref()
            .map(|f| f.binarizer.classes())
            .unwrap_or(&[])
    }

    pub fn fit(&mut self, samples: &[SampleRecord]) -> Result<(), PredictionError> {
        if samples.is_empty() {
            return Err(PredictionError::NoTrainingRecords);
        }

        let width = samples
            .iter()
            .map(|s| s.medications.len() * FEATURES_PER_MEDICATION)
            .max()
            .unwrap_or(0);

        let x: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| fit_width(medication_features(&s.medications, &self.reference), width))
            .collect();
        let label_sets: Vec<Vec<String>> = samples.iter().map(|s| s.diseases.clone()).collect();
        let binarizer = LabelBinarizer::fit(&label_sets);
        let y = binarizer.transform(&label_sets);

        let forest = RandomForest::fit(&x, &y, &self.params)?;

        tracing::info!(
            records = x.len(),
            classes = ?binarizer.classes(),
            "Disease model trained"
        );

        self.fitted = Some(FittedState {
            forest,
            binarizer,
            width,
        });
        Ok(())
    }

    /// Predicted diseases, most likely first.
    pub fn predict(&self, medications: &[MedicationRecord]) -> Result<Vec<Prediction>, PredictionError> {
        let fitted = self.fitted.as_ref().ok_or(PredictionError::NotFitted)?;
        if medications.is_empty() {
            return Err(PredictionError::NoMedications);
        }

        let features = fit_width(medication_features(medications, &self.reference), fitted.width);
        let probabilities = fitted.forest.predict_proba(&features);

        let mut results: Vec<Prediction> = fitted
            .binarizer
            .classes()
            .iter()
            .zip(probabilities)
            .filter_map(|(disease, p)| {
                let percent = p * 100.0;
                (percent > REPORTING_THRESHOLD_PERCENT).then(|| Prediction {
                    disease: disease.clone(),
                    probability: cap_percentage(percent),
                    contributing_factors: self.contributing_factors(medications, disease),
                    confidence_level: self.confidence_level(medications, disease),
                })
            })
            .collect();

        self.apply_domain_knowledge(medications, &mut results);
        results.sort_by(|a, b| b.probability.cmp(&a.probability));

        tracing::debug!(
            medications = medications.len(),
            predictions = results.len(),
            "Prediction complete"
        );
        Ok(results)
    }

    /// Predictions wrapped with the echoed input, timestamp and disclaimer.
    ///
    /// `analyzed` is echoed untouched, so unknown fields and `null`s survive.
    pub fn predict_report(
        &self,
        medications: &[MedicationRecord],
        analyzed: Vec<Value>,
    ) -> Result<PredictionReport, PredictionError> {
        let predictions = self.predict(medications)?;
        Ok(PredictionReport {
            medications_analyzed: analyzed,
            predictions,
            analysis_timestamp: chrono::Utc::now().to_rfc3339(),
            disclaimer: DISCLAIMER.to_string(),
        })
    }

    fn contributing_factors(
        &self,
        medications: &[MedicationRecord],
        disease: &str,
    ) -> Vec<ContributingFactor> {
        medications
            .iter()
            .filter_map(|med| {
                let mapping = self.reference.mapping_for(&med.name)?;
                mapping.confidence_for(disease)?;
                Some(ContributingFactor {
                    medication: med.name.clone(),
                    duration: med.duration_or_zero(),
                    adherence: med.adherence_or_default(),
                    typical_duration: mapping.min_duration_days,
                })
            })
            .collect()
    }

    /// Mean mapped confidence over the medications pointing at `disease`.
    fn confidence_level(&self, medications: &[MedicationRecord], disease: &str) -> u32 {
        let scores: Vec<f64> = medications
            .iter()
            .filter_map(|med| self.reference.mapping_for(&med.name)?.confidence_for(disease))
            .collect();
        if scores.is_empty() {
            return 0;
        }
        cap_percentage(scores.iter().sum::<f64>() / scores.len() as f64 * 100.0)
    }

    /// Scale forest predictions by duration and adherence, and add mapped
    /// diseases the forest did not report.
    fn apply_domain_knowledge(&self, medications: &[MedicationRecord], results: &mut Vec<Prediction>) {
        for med in medications {
            let Some(mapping) = self.reference.mapping_for(&med.name) else {
                continue;
            };

            for (disease, confidence) in mapping.scored_diseases() {
                match results.iter_mut().find(|r| r.disease == disease) {
                    Some(existing) => {
                        let duration_factor = (med.duration_or_zero()
                            / f64::from(mapping.min_duration_days))
                        .min(MAX_DURATION_FACTOR);
                        let adjusted = f64::from(existing.probability)
                            * duration_factor
                            * med.adherence_or_default();
                        existing.probability = cap_percentage(adjusted);
                    }
                    None => {
                        let single = std::slice::from_ref(med);
                        results.push(Prediction {
                            disease: disease.to_string(),
                            probability: cap_percentage(confidence * 100.0),
                            contributing_factors: self.contributing_factors(single, disease),
                            confidence_level: self.confidence_level(single, disease),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Arc<ReferenceData> {
        Arc::new(ReferenceData::builtin())
    }

    /// Every tree sees both samples, so inputs on the P001 side of any
    /// split get exactly P001's labels.
    fn deterministic_model() -> DiseasePredictionModel {
        let reference = reference();
        let samples = reference.samples.clone();
        let mut model = DiseasePredictionModel::with_params(
            reference,
            ForestParams {
                bootstrap: false,
                ..ForestParams::default()
            },
        );
        model.fit(&samples).unwrap();
        model
    }

    fn p001_medications() -> Vec<MedicationRecord> {
        vec![
            MedicationRecord::new("Lisinopril")
                .with_dosage("10mg")
                .with_duration(180.0)
                .with_adherence(0.95),
            MedicationRecord::new("Metformin")
                .with_dosage("500mg")
                .with_duration(365.0)
                .with_adherence(0.88),
        ]
    }

    fn find<'a>(predictions: &'a [Prediction], disease: &str) -> &'a Prediction {
        predictions
            .iter()
            .find(|p| p.disease == disease)
            .unwrap_or_else(|| panic!("missing prediction for {disease}"))
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = DiseasePredictionModel::new(reference());
        assert!(matches!(
            model.predict(&p001_medications()),
            Err(PredictionError::NotFitted)
        ));
    }

    #[test]
    fn fit_rejects_empty_samples() {
        let mut model = DiseasePredictionModel::new(reference());
        assert!(matches!(model.fit(&[]), Err(PredictionError::NoTrainingRecords)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn trained_model_has_sorted_classes() {
        let model = DiseasePredictionModel::trained(reference()).unwrap();
        assert!(model.is_fitted());
        assert_eq!(
            model.classes(),
            &["Hypercholesterolemia", "Hypertension", "Type 2 Diabetes"]
        );
    }

    #[test]
    fn empty_medications_rejected() {
        let model = deterministic_model();
        assert!(matches!(model.predict(&[]), Err(PredictionError::NoMedications)));
    }

    #[test]
    fn training_patient_gets_capped_and_mapped_predictions() {
        let model = deterministic_model();
        let predictions = model.predict(&p001_medications()).unwrap();

        let diseases: Vec<&str> = predictions.iter().map(|p| p.disease.as_str()).collect();
        assert_eq!(
            diseases,
            vec!["Hypertension", "Type 2 Diabetes", "Heart Failure", "Prediabetes"]
        );

        let hypertension = find(&predictions, "Hypertension");
        assert_eq!(hypertension.probability, 95);
        assert_eq!(hypertension.confidence_level, 90);
        assert_eq!(hypertension.contributing_factors.len(), 1);
        assert_eq!(hypertension.contributing_factors[0].typical_duration, 30);

        assert_eq!(find(&predictions, "Type 2 Diabetes").confidence_level, 85);
        assert_eq!(find(&predictions, "Heart Failure").probability, 70);
        assert_eq!(find(&predictions, "Prediabetes").probability, 65);
    }

    #[test]
    fn short_duration_scales_probability_down() {
        let model = deterministic_model();
        let mut meds = p001_medications();
        meds[0].duration_days = Some(15.0);

        let predictions = model.predict(&meds).unwrap();
        // 95 * (15 / 30) * 0.95 = 45.125
        assert_eq!(find(&predictions, "Hypertension").probability, 45);
        assert_eq!(find(&predictions, "Type 2 Diabetes").probability, 95);
    }

    #[test]
    fn repeated_medication_scales_each_entry() {
        let model = DiseasePredictionModel::trained(reference()).unwrap();
        let entry = MedicationRecord::new("Lisinopril")
            .with_duration(15.0)
            .with_adherence(0.5);
        let predictions = model.predict(&[entry.clone(), entry]).unwrap();

        // Added by the first entry at 70, scaled by the second: 70 * 0.5 * 0.5 = 17.5
        let heart_failure = find(&predictions, "Heart Failure");
        assert_eq!(heart_failure.probability, 18);
        assert_eq!(heart_failure.confidence_level, 70);
        assert_eq!(heart_failure.contributing_factors.len(), 1);

        let hypertension = find(&predictions, "Hypertension");
        assert_eq!(hypertension.probability, 4);
        assert_eq!(hypertension.confidence_level, 90);
        assert_eq!(hypertension.contributing_factors.len(), 2);
    }

    #[test]
    fn confidence_is_mean_over_relevant_medications() {
        let mut data = ReferenceData::builtin();
        let metformin = data
            .mappings
            .iter_mut()
            .find(|m| m.medication == "Metformin")
            .unwrap();
        metformin.diseases.push("Hypertension".into());
        metformin.confidence_scores.push(0.60);
        let reference = Arc::new(data);

        let samples = reference.samples.clone();
        let mut model = DiseasePredictionModel::with_params(
            reference,
            ForestParams {
                bootstrap: false,
                ..ForestParams::default()
            },
        );
        model.fit(&samples).unwrap();

        let meds = p001_medications();
        assert_eq!(model.confidence_level(&meds, "Hypertension"), 75);

        let predictions = model.predict(&meds).unwrap();
        let hypertension = find(&predictions, "Hypertension");
        assert_eq!(hypertension.confidence_level, 75);
        let factors: Vec<&str> = hypertension
            .contributing_factors
            .iter()
            .map(|f| f.medication.as_str())
            .collect();
        assert_eq!(factors, vec!["Lisinopril", "Metformin"]);
        assert_eq!(find(&predictions, "Type 2 Diabetes").confidence_level, 85);
    }

    #[test]
    fn mapped_disease_added_when_forest_silent() {
        let model = DiseasePredictionModel::trained(reference()).unwrap();
        let meds = vec![MedicationRecord::new("Lisinopril")
            .with_duration(180.0)
            .with_adherence(0.95)];
        let predictions = model.predict(&meds).unwrap();

        let heart_failure = find(&predictions, "Heart Failure");
        assert_eq!(heart_failure.probability, 70);
        assert_eq!(heart_failure.confidence_level, 70);
        assert_eq!(heart_failure.contributing_factors[0].medication, "Lisinopril");
        assert!(predictions.iter().any(|p| p.disease == "Hypertension"));
    }

    #[test]
    fn predictions_sorted_and_capped() {
        let model = DiseasePredictionModel::trained(reference()).unwrap();
        let meds = vec![
            MedicationRecord::new("Atorvastatin").with_duration(400.0),
            MedicationRecord::new("metformin").with_duration(10.0).with_adherence(0.5),
        ];
        let predictions = model.predict(&meds).unwrap();
        assert!(!predictions.is_empty());
        assert!(predictions.iter().all(|p| p.probability <= 95));
        assert!(predictions
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability));
    }

    #[test]
    fn unknown_medication_has_no_factors() {
        let model = DiseasePredictionModel::trained(reference()).unwrap();
        let predictions = model.predict(&[MedicationRecord::new("Ibuprofen")]).unwrap();
        for p in &predictions {
            assert!(p.contributing_factors.is_empty());
            assert_eq!(p.confidence_level, 0);
        }
    }

    #[test]
    fn prediction_is_deterministic() {
        let a = DiseasePredictionModel::trained(reference()).unwrap();
        let b = DiseasePredictionModel::trained(reference()).unwrap();
        let meds = vec![MedicationRecord::new("Lisinopril").with_duration(60.0)];
        assert_eq!(a.predict(&meds).unwrap(), b.predict(&meds).unwrap());
    }

    #[test]
    fn report_echoes_input_with_disclaimer() {
        let model = deterministic_model();
        let sent = vec![
            serde_json::json!({"name": "Lisinopril", "dosage": "10mg", "duration_days": 180, "adherence_rate": 0.95}),
            serde_json::json!({"name": "Metformin", "dosage": "500mg", "duration_days": 365, "adherence_rate": 0.88, "refills": null}),
        ];
        let report = model.predict_report(&p001_medications(), sent.clone()).unwrap();
        assert_eq!(report.medications_analyzed, sent);
        assert_eq!(report.disclaimer, DISCLAIMER);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.analysis_timestamp).is_ok());
        assert_eq!(report.predictions.len(), 4);
    }
}
