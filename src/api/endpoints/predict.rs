//! `POST /api/predict` — disease likelihoods for a medication list.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde_json::Value;

use super::{parse_medication_list, ListMessages};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, RequestId};
use crate::prediction::PredictionReport;

const MESSAGES: ListMessages = ListMessages {
    field: "medications",
    missing: "No medications provided in request",
    not_list: "Medications must be provided as a list",
    not_object: "Each medication must be an object with name, dosage, and duration",
    missing_name: "Each medication must have a name",
};

pub async fn predict(
    State(ctx): State<ApiContext>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionReport>, ApiError> {
    let Json(body) = body?;
    let parsed = parse_medication_list(&body, &MESSAGES)?;

    let report = ctx
        .core
        .model()
        .predict_report(&parsed.records, parsed.raw)
        .inspect_err(|e| tracing::warn!(%request_id, error = %e, "Prediction failed"))?;

    tracing::info!(
        %request_id,
        medications = report.medications_analyzed.len(),
        predictions = report.predictions.len(),
        "Prediction served"
    );
    Ok(Json(report))
}
