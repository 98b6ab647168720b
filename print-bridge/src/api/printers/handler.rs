//! Printer API Handlers

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use kiosk_printer::{DiscoverySnapshot, PrinterInfo};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// Printer listing payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterList {
    pub printers: Vec<PrinterInfo>,
    pub total: usize,
    pub capable_count: usize,
    pub captured_at: DateTime<Utc>,
}

impl From<&DiscoverySnapshot> for PrinterList {
    fn from(snapshot: &DiscoverySnapshot) -> Self {
        Self {
            printers: snapshot.printers.clone(),
            total: snapshot.len(),
            capable_count: snapshot.capable_count(),
            captured_at: snapshot.captured_at,
        }
    }
}

/// GET /printers - cached snapshot, enumerated when stale
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<PrinterList>>> {
    let snapshot = state.discovery.list_printers().await;
    Ok(ok(PrinterList::from(snapshot.as_ref())))
}

/// POST /printers/refresh - forced enumeration
pub async fn refresh(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<PrinterList>>> {
    let snapshot = state.discovery.refresh().await;
    tracing::info!(total = snapshot.len(), "Printer list refreshed on request");
    Ok(ok(PrinterList::from(snapshot.as_ref())))
}
