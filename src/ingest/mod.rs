//! Batch ingestion: category validation and record decoding.
//!
//! The HTTP handler hands the raw batch here; the decoder turns loose JSON
//! field-sets into typed [`crate::types::Record`]s. Malformed records are
//! skipped and counted, never fatal to the batch. An unknown category is
//! rejected before any state is touched.

mod decoder;

pub use decoder::{decode_batch, decode_record, DecodeError, DecodedBatch};

use thiserror::Error;

/// Errors that reject a batch at the ingestion boundary.
///
/// These are reported in the call's response payload; they never mutate
/// cycle state and never abort the process.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Category tag outside the closed set. The call has no side effects.
    #[error("unknown category '{0}' (expected one of: who, hospital, secretariat)")]
    UnknownCategory(String),
}
