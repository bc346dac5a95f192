//! Raw field-set decoding into typed records.
//!
//! Each inbound record arrives as an untyped JSON object implicitly tagged
//! by its batch's category. Decoding validates the shape against that
//! category's schema before constructing the variant; the few cross-field
//! rules the upstream coding guarantees (sex is 0/1, dates are non-empty)
//! are enforced here rather than downstream.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::types::{Category, HospitalAdmission, Record, SecretariatCase, WhoReport};

/// Why a single record was skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {category} record: {reason}")]
    Malformed { category: Category, reason: String },
}

/// Result of decoding one batch: the records that survived, plus the count
/// of field-sets that were skipped as malformed.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub records: Vec<Record>,
    pub skipped: usize,
}

/// Decode every field-set in a batch under the given category.
///
/// Skipped records are logged at debug with the reason; the batch itself
/// always succeeds.
pub fn decode_batch(category: Category, raw: &[Value]) -> DecodedBatch {
    let mut out = DecodedBatch {
        records: Vec::with_capacity(raw.len()),
        skipped: 0,
    };

    for (i, value) in raw.iter().enumerate() {
        match decode_record(category, value) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                debug!(category = %category, index = i, error = %e, "Skipping malformed record");
                out.skipped += 1;
            }
        }
    }

    out
}

/// Decode one raw field-set into the typed record for `category`.
pub fn decode_record(category: Category, value: &Value) -> Result<Record, DecodeError> {
    let malformed = |reason: String| DecodeError::Malformed { category, reason };

    let record = match category {
        Category::Who => {
            let report: WhoReport =
                serde_json::from_value(value.clone()).map_err(|e| malformed(e.to_string()))?;
            if report.date.is_empty() {
                return Err(malformed("empty date".to_string()));
            }
            Record::Who(report)
        }
        Category::Hospital => {
            let admission: HospitalAdmission =
                serde_json::from_value(value.clone()).map_err(|e| malformed(e.to_string()))?;
            if admission.date.is_empty() {
                return Err(malformed("empty date".to_string()));
            }
            if admission.sex > 1 {
                return Err(malformed(format!("sex out of range: {}", admission.sex)));
            }
            Record::Hospital(admission)
        }
        Category::Secretariat => {
            let case: SecretariatCase =
                serde_json::from_value(value.clone()).map_err(|e| malformed(e.to_string()))?;
            if case.date.is_empty() {
                return Err(malformed("empty date".to_string()));
            }
            Record::Secretariat(case)
        }
    };

    Ok(record)
}
