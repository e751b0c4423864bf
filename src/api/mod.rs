//! HTTP API.
//!
//! Routes are nested under `/api/`. Every request passes through the
//! audit middleware; CORS is applied on top when enabled in config.
//!
//! The router is composable: `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{ApiServer, ApiSession};
pub use types::ApiContext;
