//! Health check route
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /health | GET | Liveness plus the default printer |
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "defaultPrinter": "Front Desk",
//!   "timestamp": "2026-10-11T09:30:05Z"
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    default_printer: Option<String>,
    timestamp: DateTime<Utc>,
}

/// Never fails and never touches the spooler; the default printer comes
/// from the last published snapshot
pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let default_printer = state
        .discovery
        .cached()
        .default_printer()
        .map(|p| p.name.clone());

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        default_printer,
        timestamp: Utc::now(),
    })
}
