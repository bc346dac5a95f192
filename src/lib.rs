//! epigate: Epidemiological Surveillance Ingestion Gateway
//!
//! Aggregation coordinator for partial batches of surveillance records
//! pushed by independent producers.
//!
//! ## Architecture
//!
//! - **Ingestion Endpoint**: validates and decodes inbound batches
//! - **Cycle State**: the lock-protected per-category accumulator
//! - **Completeness Barrier**: edge-triggered "all categories present" check
//! - **Pipeline Dispatcher**: serializes artifacts and runs the external
//!   analysis pipeline exactly once per complete set
//! - **Cycle Reset**: returns the gateway to the empty state, success or
//!   failure, so a broken pipeline can never wedge ingestion

pub mod api;
pub mod config;
pub mod dispatch;
pub mod ingest;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::GatewayConfig;

// Re-export commonly used types
pub use types::{Category, RawBatch, Record};

// Re-export pipeline components
pub use pipeline::{AppState, BatchReceipt, CycleCoordinator, CycleState, GatewayStatus};

// Re-export dispatch components
pub use dispatch::{DispatchError, DispatchReport, PipelineRunner, ProcessRunner};
