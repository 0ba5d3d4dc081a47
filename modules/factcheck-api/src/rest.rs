use std::sync::Arc;

use axum::{extract::State, response::Json};
use tracing::info;

use factcheck_common::{InvestigateRequest, InvestigationReport, ScanReport, ScanRequest};

use crate::AppState;

/// Single-text investigation, outside the scan budget.
pub async fn api_investigate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InvestigateRequest>,
) -> Json<InvestigationReport> {
    let investigation = state.investigator.investigate(&body.text, "").await;
    info!(verdict = %investigation.verdict, "Investigation complete");
    Json(InvestigationReport::new(body.text, investigation))
}

/// Budgeted batch scan of page blocks.
pub async fn api_scan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScanRequest>,
) -> Json<ScanReport> {
    info!(
        blocks = body.blocks.len(),
        has_url = body.url.is_some(),
        "Scan request received"
    );
    let report = state.orchestrator.run(body).await;
    Json(report)
}
