//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub model_fitted: bool,
    pub started_at: String,
    pub requests_served: u64,
}

/// `GET /api/health` — liveness check.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Service is running",
        version: crate::config::APP_VERSION,
        model_fitted: ctx.core.model().is_fitted(),
        started_at: ctx.core.started_at().to_rfc3339(),
        requests_served: ctx.core.requests_served(),
    })
}
