//! Known medication pair interactions.

use serde::{Deserialize, Serialize};

use crate::models::{normalize_name, InteractionRisk, MedicationRecord};

pub const MONITOR_RECOMMENDATION: &str = "Monitor closely";

/// An unordered medication pair with a risk level.
#[derive(Debug, Clone, Copy)]
pub struct InteractionRule {
    pub medications: [&'static str; 2],
    pub risk: InteractionRisk,
}

pub const INTERACTION_RULES: &[InteractionRule] = &[
    InteractionRule {
        medications: ["Lisinopril", "Spironolactone"],
        risk: InteractionRisk::High,
    },
    InteractionRule {
        medications: ["Metformin", "Atorvastatin"],
        risk: InteractionRisk::Moderate,
    },
    InteractionRule {
        medications: ["Warfarin", "Aspirin"],
        risk: InteractionRisk::High,
    },
];

impl InteractionRule {
    fn covers(&self, name: &str) -> bool {
        self.medications.iter().any(|m| normalize_name(m) == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialInteraction {
    pub medications: [String; 2],
    pub severity: InteractionRisk,
    pub recommendation: String,
}

/// Risk level when `a` and `b` form a known pair. Names compare
/// case-insensitively; a medication never interacts with itself.
pub fn check_interaction(a: &str, b: &str) -> Option<InteractionRisk> {
    let (a, b) = (normalize_name(a), normalize_name(b));
    if a == b {
        return None;
    }
    INTERACTION_RULES
        .iter()
        .find(|rule| rule.covers(&a) && rule.covers(&b))
        .map(|rule| rule.risk)
}

/// Every unordered pair in `history` matching a known interaction,
/// in first-occurrence order.
pub fn find_interactions(history: &[MedicationRecord]) -> Vec<PotentialInteraction> {
    let mut found: Vec<PotentialInteraction> = Vec::new();
    let mut seen: Vec<(String, String)> = Vec::new();

    for (i, first) in history.iter().enumerate() {
        for second in &history[i + 1..] {
            let Some(risk) = check_interaction(&first.name, &second.name) else {
                continue;
            };

            let mut key = (first.normalized_name(), second.normalized_name());
            if key.0 > key.1 {
                std::mem::swap(&mut key.0, &mut key.1);
            }
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            tracing::debug!(
                first = %first.name,
                second = %second.name,
                risk = %risk,
                "Potential interaction"
            );
            found.push(PotentialInteraction {
                medications: [first.name.clone(), second.name.clone()],
                severity: risk,
                recommendation: MONITOR_RECOMMENDATION.to_string(),
            });
        }
    }
    found
}
