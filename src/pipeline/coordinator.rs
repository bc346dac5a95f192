//! Cycle Coordinator - ingestion, barrier, dispatch, reset
//!
//! This module implements the per-batch processing sequence:
//!
//! ```text
//! STEP 1: Category validation (unknown tag -> rejected, no side effects)
//! STEP 2: Record decoding (malformed field-sets skipped, counted)
//! STEP 3: Append under the cycle lock
//! STEP 4: Completeness barrier (edge-triggered, same critical section)
//! STEP 5: On completion - snapshot + in-memory reset, lock released
//! STEP 6: Artifact writing + external pipeline run (dispatch gate held)
//! STEP 7: Artifact cleanup, outcome reported to the triggering caller
//! ```
//!
//! CRITICAL GUARANTEE: for every transition of the cycle state into
//! "all categories populated", the external pipeline runs exactly once,
//! and exactly one caller receives its outcome.
//!
//! Concurrency choice: copy-out with a cycle token. The shared lock covers
//! append + barrier + snapshot only; the (potentially slow) pipeline run
//! happens outside it, serialized behind a dedicated dispatch gate. Batches
//! arriving during an in-flight dispatch accumulate into the next cycle
//! under the bumped token.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::dispatch::{artifacts, DispatchReport, PipelineRunner};
use crate::ingest::{decode_batch, IngestError};
use crate::types::{Category, RawBatch};

use super::cycle::{CycleSnapshot, CycleState};
use super::state::{AppState, GatewayStatus, LastDispatch};

/// Outcome of one submitted batch, rendered into the HTTP response.
#[derive(Debug)]
pub struct BatchReceipt {
    /// Canonicalized category of the batch
    pub category: Category,
    /// Records decoded and appended
    pub accepted: usize,
    /// Malformed records skipped
    pub skipped: usize,
    /// Present only for the call whose append completed the cycle
    pub dispatch: Option<DispatchReport>,
}

/// Coordinates the shared cycle state across concurrent ingestion calls
/// and drives the dispatcher when the barrier trips.
///
/// Constructed once at startup; all handlers share it through an `Arc`.
pub struct CycleCoordinator {
    /// The one shared mutable accumulator. Every read and write happens
    /// inside a single critical section per batch.
    cycle: Mutex<CycleState>,
    /// Serializes dispatches so the runner is never invoked concurrently,
    /// even when the next cycle completes while one is in flight.
    dispatch_gate: Mutex<()>,
    runner: Box<dyn PipelineRunner>,
    artifact_dir: PathBuf,
    app_state: Arc<RwLock<AppState>>,
}

impl CycleCoordinator {
    pub fn new(
        runner: Box<dyn PipelineRunner>,
        artifact_dir: PathBuf,
        app_state: Arc<RwLock<AppState>>,
    ) -> Self {
        info!(artifact_dir = %artifact_dir.display(), "Initializing cycle coordinator");
        Self {
            cycle: Mutex::new(CycleState::new()),
            dispatch_gate: Mutex::new(()),
            runner,
            artifact_dir,
            app_state,
        }
    }

    /// Ingest one batch: validate, decode, append, and — if this append
    /// completes the set — dispatch and reset.
    ///
    /// Returns the receipt for the caller; only an unknown category is an
    /// error, and that error is guaranteed side-effect free.
    pub async fn submit(&self, batch: RawBatch) -> Result<BatchReceipt, IngestError> {
        let Some(category) = Category::parse(&batch.category) else {
            warn!(category = %batch.category, filename = %batch.filename, "Rejected batch with unknown category");
            self.app_state.write().await.batches_rejected += 1;
            return Err(IngestError::UnknownCategory(batch.category));
        };

        let decoded = decode_batch(category, &batch.records);
        let accepted = decoded.records.len();
        let skipped = decoded.skipped;

        info!(
            category = %category,
            filename = %batch.filename,
            received = batch.records.len(),
            accepted = accepted,
            skipped = skipped,
            "Batch received"
        );

        // STEP 3-5: one critical section — append, barrier, snapshot.
        let (snapshot, open_cycle) = {
            let mut cycle = self.cycle.lock().await;
            cycle.append(category, decoded.records);
            let snapshot = cycle.complete_snapshot();
            (snapshot, !cycle.is_empty())
        };

        {
            let mut state = self.app_state.write().await;
            state.batches_accepted += 1;
            state.records_ingested += accepted as u64;
            state.records_skipped += skipped as u64;
            state.status = if snapshot.is_some() {
                GatewayStatus::Dispatching
            } else if open_cycle {
                GatewayStatus::Accumulating
            } else {
                GatewayStatus::Idle
            };
        }

        let dispatch = match snapshot {
            Some(snapshot) => Some(self.dispatch(snapshot).await),
            None => None,
        };

        Ok(BatchReceipt {
            category,
            accepted,
            skipped,
            dispatch,
        })
    }

    /// Per-category record counts of the open cycle, with its token and
    /// wall-clock start. For the status endpoint.
    pub async fn cycle_status(&self) -> (u64, [usize; Category::COUNT], Option<chrono::DateTime<chrono::Utc>>) {
        let cycle = self.cycle.lock().await;
        (cycle.token(), cycle.fill(), cycle.started_at())
    }

    /// STEP 6-7: serialize artifacts, run the external pipeline once, clean
    /// up, and record the outcome.
    ///
    /// Never fails the call: every dispatch error becomes a failure report
    /// for the triggering caller. The in-memory cycle was already reset at
    /// snapshot time, so the gateway cannot wedge on a broken pipeline.
    async fn dispatch(&self, snapshot: CycleSnapshot) -> DispatchReport {
        let _gate = self.dispatch_gate.lock().await;

        let cycle = snapshot.token;
        let records = snapshot.total_records();

        info!(
            cycle = cycle,
            records = records,
            "Cycle complete — dispatching to analysis pipeline"
        );

        let paths = match artifacts::write_artifacts(&self.artifact_dir, cycle, &snapshot.records).await {
            Ok(paths) => paths,
            Err(e) => {
                // Write failure aborts dispatch and counts as a pipeline
                // failure. Clean up whatever was partially written.
                let partial: Vec<PathBuf> = Category::ALL
                    .iter()
                    .map(|c| artifacts::artifact_path(&self.artifact_dir, cycle, *c))
                    .collect();
                artifacts::remove_artifacts(&partial).await;

                let elapsed = snapshot.started.elapsed();
                return self
                    .finish(cycle, false, elapsed, records, format!("dispatch aborted: {e}"))
                    .await;
            }
        };

        let run_result = self.runner.run(&paths).await;
        let elapsed = snapshot.started.elapsed();

        artifacts::remove_artifacts(&paths).await;

        match run_result {
            Ok(_) => {
                let detail = format!(
                    "complete set of {} records processed in {:.2}s",
                    records,
                    elapsed.as_secs_f64()
                );
                self.finish(cycle, true, elapsed, records, detail).await
            }
            Err(e) => self.finish(cycle, false, elapsed, records, e.to_string()).await,
        }
    }

    /// Record the dispatch outcome in the shared counters and compose the
    /// report for the triggering caller.
    async fn finish(
        &self,
        cycle: u64,
        success: bool,
        elapsed: Duration,
        records: usize,
        detail: String,
    ) -> DispatchReport {
        let idle = self.cycle.lock().await.is_empty();
        {
            let mut state = self.app_state.write().await;
            if success {
                state.cycles_completed += 1;
            } else {
                state.cycles_failed += 1;
            }
            state.last_dispatch = Some(LastDispatch {
                cycle,
                success,
                elapsed_ms: elapsed.as_millis() as u64,
                records,
                detail: detail.clone(),
                finished_at: chrono::Utc::now(),
            });
            state.status = if idle {
                GatewayStatus::Idle
            } else {
                GatewayStatus::Accumulating
            };
        }

        if success {
            info!(
                cycle = cycle,
                elapsed_ms = elapsed.as_millis() as u64,
                records = records,
                "Dispatch complete"
            );
        } else {
            error!(
                cycle = cycle,
                elapsed_ms = elapsed.as_millis() as u64,
                detail = %detail,
                "Dispatch failed — cycle data discarded"
            );
        }

        DispatchReport {
            cycle,
            success,
            elapsed,
            records,
            detail,
        }
    }
}
