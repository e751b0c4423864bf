//! Medication history analysis: adherence metrics, long-term medications,
//! interaction warnings and follow-up recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interactions::{find_interactions, PotentialInteraction};
use crate::models::{
    AdherenceStatus, MedicationRecord, RecommendationCategory, RecommendationPriority,
};

/// Medications taken for longer than this many days count as long-term.
pub const LONG_TERM_THRESHOLD_DAYS: f64 = 90.0;

/// Below this average adherence (percent) a reminder recommendation is added.
pub const ADHERENCE_TARGET_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationMetrics {
    pub total_medications: usize,
    pub long_term_medications: usize,
    /// Percent, one decimal place.
    pub average_adherence: f64,
    pub adherence_status: AdherenceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermMedication {
    pub name: String,
    pub duration_days: f64,
    pub adherence_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub recommendation: String,
    pub priority: RecommendationPriority,
}

impl Recommendation {
    fn new(
        category: RecommendationCategory,
        recommendation: &str,
        priority: RecommendationPriority,
    ) -> Self {
        Self {
            category,
            recommendation: recommendation.to_string(),
            priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryAnalysis {
    pub analysis_date: String,
    pub medication_metrics: MedicationMetrics,
    pub long_term_medications: Vec<LongTermMedication>,
    pub potential_interactions: Vec<PotentialInteraction>,
    pub recommendations: Vec<Recommendation>,
}

/// Mean reported adherence as a percentage; 0 when no entry reports one.
pub fn average_adherence(history: &[MedicationRecord]) -> f64 {
    let rates: Vec<f64> = history.iter().filter_map(|m| m.adherence_rate).collect();
    if rates.is_empty() {
        return 0.0;
    }
    rates.iter().sum::<f64>() / rates.len() as f64 * 100.0
}

pub fn long_term_medications(history: &[MedicationRecord]) -> Vec<LongTermMedication> {
    history
        .iter()
        .filter(|m| m.duration_or_zero() > LONG_TERM_THRESHOLD_DAYS)
        .map(|m| LongTermMedication {
            name: m.name.clone(),
            duration_days: m.duration_or_zero(),
            adherence_rate: m.adherence_rate,
        })
        .collect()
}

fn monitoring_recommendation(medication: &str) -> Option<&'static str> {
    match medication {
        "lisinopril" => Some("Schedule regular blood pressure monitoring"),
        "metformin" => Some("Schedule regular blood glucose monitoring"),
        _ => None,
    }
}

pub fn generate_recommendations(
    history: &[MedicationRecord],
    adherence_percent: f64,
    interactions: &[PotentialInteraction],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if adherence_percent < ADHERENCE_TARGET_PERCENT {
        recommendations.push(Recommendation::new(
            RecommendationCategory::Adherence,
            "Consider using medication reminders or pill organizers to improve adherence",
            RecommendationPriority::High,
        ));
    }

    if !interactions.is_empty() {
        recommendations.push(Recommendation::new(
            RecommendationCategory::Interactions,
            "Discuss potential medication interactions with your healthcare provider",
            RecommendationPriority::High,
        ));
    }

    let mut monitored: Vec<String> = Vec::new();
    for med in history {
        let name = med.normalized_name();
        if monitored.contains(&name) {
            continue;
        }
        if let Some(text) = monitoring_recommendation(&name) {
            recommendations.push(Recommendation::new(
                RecommendationCategory::Monitoring,
                text,
                RecommendationPriority::Medium,
            ));
            monitored.push(name);
        }
    }

    recommendations
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Analyse a medication history as of `now`.
pub fn analyze_history(history: &[MedicationRecord], now: DateTime<Utc>) -> HistoryAnalysis {
    let adherence = average_adherence(history);
    let long_term = long_term_medications(history);
    let interactions = find_interactions(history);
    let recommendations = generate_recommendations(history, adherence, &interactions);

    tracing::debug!(
        medications = history.len(),
        long_term = long_term.len(),
        interactions = interactions.len(),
        adherence,
        "History analysed"
    );

    HistoryAnalysis {
        analysis_date: now.to_rfc3339(),
        medication_metrics: MedicationMetrics {
            total_medications: history.len(),
            long_term_medications: long_term.len(),
            average_adherence: round_one_decimal(adherence),
            adherence_status: AdherenceStatus::from_percentage(adherence),
        },
        long_term_medications: long_term,
        potential_interactions: interactions,
        recommendations,
    }
}
