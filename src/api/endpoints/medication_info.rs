//! `GET /api/medication_info/:medication` — medication monograph.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::medications::MedicationInfo;

pub async fn lookup(
    State(ctx): State<ApiContext>,
    Path(medication): Path<String>,
) -> Result<Json<MedicationInfo>, ApiError> {
    ctx.core
        .catalog()
        .lookup(&medication)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Medication information not found".into()))
}
