//! Application State and Gateway Status
//!
//! Operational counters for the ingestion pipeline, accessible from API
//! handlers and the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ============================================================================
// Application State
// ============================================================================

/// Shared operational state for status reporting.
///
/// This struct is wrapped in `Arc<RwLock<>>` for thread-safe access across
/// the async runtime. It carries counters only — the aggregation cycle
/// itself lives in [`crate::pipeline::CycleState`] behind its own lock.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    /// Process start (serialization skipped; exposed as uptime_secs)
    #[serde(skip)]
    pub started: Instant,

    /// Current gateway status
    pub status: GatewayStatus,

    /// Batches accepted (valid category, regardless of skipped records)
    pub batches_accepted: u64,

    /// Batches rejected at the boundary (unknown category)
    pub batches_rejected: u64,

    /// Records decoded and appended across all cycles
    pub records_ingested: u64,

    /// Malformed records skipped inside otherwise-valid batches
    pub records_skipped: u64,

    /// Cycles dispatched with a successful pipeline run
    pub cycles_completed: u64,

    /// Cycles dispatched whose pipeline run failed (data discarded)
    pub cycles_failed: u64,

    /// Report of the most recent dispatch, success or failure
    pub last_dispatch: Option<LastDispatch>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            status: GatewayStatus::Idle,
            batches_accepted: 0,
            batches_rejected: 0,
            records_ingested: 0,
            records_skipped: 0,
            cycles_completed: 0,
            cycles_failed: 0,
            last_dispatch: None,
        }
    }
}

impl AppState {
    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Snapshot of the most recent dispatch, kept for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastDispatch {
    /// Cycle token
    pub cycle: u64,
    /// Whether the pipeline exited successfully
    pub success: bool,
    /// Wall time from first accepted record to pipeline completion (ms)
    pub elapsed_ms: u64,
    /// Records handed to the pipeline
    pub records: usize,
    /// Success note or failure detail
    pub detail: String,
    /// When the dispatch finished
    pub finished_at: DateTime<Utc>,
}

/// Gateway operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayStatus {
    /// No cycle open, waiting for the first batch
    Idle,
    /// At least one, not all, categories populated
    Accumulating,
    /// A completed cycle is being handed to the external pipeline
    Dispatching,
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayStatus::Idle => write!(f, "Idle"),
            GatewayStatus::Accumulating => write!(f, "Accumulating"),
            GatewayStatus::Dispatching => write!(f, "Dispatching"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_default() {
        let state = AppState::default();

        assert_eq!(state.status, GatewayStatus::Idle);
        assert_eq!(state.batches_accepted, 0);
        assert_eq!(state.cycles_completed, 0);
        assert!(state.last_dispatch.is_none());
    }

    #[test]
    fn test_gateway_status_display() {
        assert_eq!(format!("{}", GatewayStatus::Idle), "Idle");
        assert_eq!(format!("{}", GatewayStatus::Accumulating), "Accumulating");
        assert_eq!(format!("{}", GatewayStatus::Dispatching), "Dispatching");
    }
}
