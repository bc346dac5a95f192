//! System-wide default constants.
//!
//! Centralises the gateway's magic numbers. Grouped by subsystem for easy
//! discovery.

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Maximum request body size (bytes).
///
/// Producers deliver tens of thousands of records per batch; 64 MiB covers
/// the largest observed feeds with margin.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// Pipeline dispatch
// ============================================================================

/// Default external analysis pipeline executable.
pub const PIPELINE_PROGRAM: &str = "./pipeline";

/// Default bound on one external pipeline run (seconds).
///
/// A run that exceeds this is killed and the cycle counts as failed.
pub const DISPATCH_TIMEOUT_SECS: u64 = 300;

/// Default directory for interchange artifacts.
pub const ARTIFACT_DIR: &str = "./artifacts";
