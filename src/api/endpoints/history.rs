//! `POST /api/analyze_history` — adherence, interactions and recommendations.

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use serde_json::Value;

use super::{parse_medication_list, ListMessages};
use crate::api::error::ApiError;
use crate::api::types::RequestId;
use crate::history::{analyze_history, HistoryAnalysis};

const MESSAGES: ListMessages = ListMessages {
    field: "history",
    missing: "No medication history provided in request",
    not_list: "History must be provided as a list",
    not_object: "Each history entry must be an object with name, dosage, and duration",
    missing_name: "Each history entry must have a name",
};

pub async fn analyze(
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<HistoryAnalysis>, ApiError> {
    let Json(body) = body?;
    let history = parse_medication_list(&body, &MESSAGES)?.records;

    let analysis = analyze_history(&history, chrono::Utc::now());

    tracing::info!(
        %request_id,
        medications = analysis.medication_metrics.total_medications,
        interactions = analysis.potential_interactions.len(),
        "History analysed"
    );
    Ok(Json(analysis))
}
