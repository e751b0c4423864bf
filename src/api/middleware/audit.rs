//! Audit logging middleware.
//!
//! Tags every API request with a request id, logs method, path, status
//! and latency, and records the access in `CoreState`'s access log.

use std::time::Instant;

use axum::extract::OriginalUri;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, RequestId};
use crate::core_state::AuditEntry;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Log API access for audit trail.
/// Accesses `ApiContext` from request extensions.
pub async fn log_access(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    // Nested routers strip the `/api` prefix from `req.uri()`.
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let request_id = uuid::Uuid::new_v4();
    let started = Instant::now();

    let ctx = req.extensions().get::<ApiContext>().cloned();
    req.extensions_mut().insert(RequestId(request_id));

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status >= 500 {
        tracing::warn!(%request_id, %method, %path, status, latency_ms, "API request failed");
    } else {
        tracing::info!(%request_id, %method, %path, status, latency_ms, "API request");
    }

    if let Some(ctx) = ctx {
        ctx.core.log_access(AuditEntry {
            request_id,
            timestamp: chrono::Utc::now(),
            method,
            path,
            status,
            latency_ms,
        });
    }

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
