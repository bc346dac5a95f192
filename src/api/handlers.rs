//! API request handlers
//!
//! Handlers are thin: decode the request, delegate to the coordinator,
//! encode the receipt. All aggregation logic lives in
//! [`crate::pipeline::CycleCoordinator`].

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::pipeline::{AppState, CycleCoordinator, LastDispatch};
use crate::types::{Category, RawBatch};

// ============================================================================
// Shared State
// ============================================================================

/// State shared by all handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<CycleCoordinator>,
    pub app_state: Arc<RwLock<AppState>>,
}

// ============================================================================
// Batch Submission
// ============================================================================

/// Response for `POST /api/v1/batches`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    /// Human-readable outcome; on a completing call this includes the
    /// pipeline result and elapsed cycle time.
    pub message: String,
    /// Records decoded and accumulated from this batch
    pub records_accepted: usize,
    /// Malformed records skipped from this batch
    pub records_skipped: usize,
    /// Present only when this call completed the cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchSummary>,
}

/// Dispatch outcome surfaced to the triggering caller.
#[derive(Debug, Serialize)]
pub struct DispatchSummary {
    pub cycle: u64,
    pub success: bool,
    pub elapsed_ms: u64,
    pub records: usize,
    pub detail: String,
}

/// POST /api/v1/batches - Submit one batch of records for a category
///
/// Unknown categories are rejected with 400 and are guaranteed to have no
/// side effects. Malformed records inside a valid batch are skipped and
/// counted, never fatal.
pub async fn submit_batch(
    State(state): State<GatewayState>,
    Json(batch): Json<RawBatch>,
) -> Response {
    match state.coordinator.submit(batch).await {
        Ok(receipt) => {
            let dispatch = receipt.dispatch.as_ref().map(|report| DispatchSummary {
                cycle: report.cycle,
                success: report.success,
                elapsed_ms: report.elapsed.as_millis() as u64,
                records: report.records,
                detail: report.detail.clone(),
            });

            let message = match &dispatch {
                Some(d) if d.success => format!(
                    "batch accepted ({} records, {} skipped); {}",
                    receipt.accepted, receipt.skipped, d.detail
                ),
                Some(d) => format!(
                    "batch accepted ({} records, {} skipped); pipeline failed: {}",
                    receipt.accepted, receipt.skipped, d.detail
                ),
                None => format!(
                    "batch accepted: {} records accumulated under '{}' ({} skipped)",
                    receipt.accepted, receipt.category, receipt.skipped
                ),
            };

            let success = dispatch.as_ref().map_or(true, |d| d.success);
            let body = SubmitResponse {
                success,
                message,
                records_accepted: receipt.accepted,
                records_skipped: receipt.skipped,
                dispatch,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            let body = SubmitResponse {
                success: false,
                message: e.to_string(),
                records_accepted: 0,
                records_skipped: 0,
                dispatch: None,
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
    }
}

// ============================================================================
// Status Endpoint
// ============================================================================

/// Fill of the open cycle, per category in canonical order.
#[derive(Debug, Serialize)]
pub struct CycleFill {
    pub who: usize,
    pub hospital: usize,
    pub secretariat: usize,
}

/// Response for `GET /api/v1/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Current gateway status (Idle / Accumulating / Dispatching)
    pub status: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Token of the open cycle
    pub cycle: u64,
    /// Wall-clock start of the open cycle, if one has begun
    pub cycle_started_at: Option<DateTime<Utc>>,
    /// Per-category record counts of the open cycle
    pub fill: CycleFill,
    pub batches_accepted: u64,
    pub batches_rejected: u64,
    pub records_ingested: u64,
    pub records_skipped: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    /// Most recent dispatch outcome, success or failure
    pub last_dispatch: Option<LastDispatch>,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/v1/status - Gateway status, open-cycle fill, lifetime counters
pub async fn get_status(State(state): State<GatewayState>) -> Json<StatusResponse> {
    let (cycle, fill, started_at) = state.coordinator.cycle_status().await;
    let app_state = state.app_state.read().await;

    Json(StatusResponse {
        status: app_state.status.to_string(),
        uptime_secs: app_state.uptime_secs(),
        cycle,
        cycle_started_at: started_at,
        fill: CycleFill {
            who: fill[Category::Who.index()],
            hospital: fill[Category::Hospital.index()],
            secretariat: fill[Category::Secretariat.index()],
        },
        batches_accepted: app_state.batches_accepted,
        batches_rejected: app_state.batches_rejected,
        records_ingested: app_state.records_ingested,
        records_skipped: app_state.records_skipped,
        cycles_completed: app_state.cycles_completed,
        cycles_failed: app_state.cycles_failed,
        last_dispatch: app_state.last_dispatch.clone(),
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Liveness probe
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "epigate",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
