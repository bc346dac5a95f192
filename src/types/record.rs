//! Typed surveillance records
//!
//! One struct per source category, plus the closed [`Record`] union the
//! aggregator accumulates. Fields mirror what the upstream feeds actually
//! send: flat primitives only, no nesting. Records are immutable once
//! constructed — the decoder validates and builds them, everything
//! downstream only reads.

use serde::{Deserialize, Serialize};

use super::Category;

/// Aggregate WHO-style situation report for one region and week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhoReport {
    /// Region postal prefix the counts are aggregated over
    pub region_code: u32,
    /// Deaths reported in the period
    pub deaths: u32,
    /// Population of the region
    pub population: u64,
    /// Recovered cases reported in the period
    pub recovered: u32,
    /// Vaccinated individuals (cumulative)
    pub vaccinated: u64,
    /// Reporting date, `DD-MM-YYYY`
    pub date: String,
}

/// One hospital admission/triage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HospitalAdmission {
    /// Reporting hospital identifier
    pub hospital_id: u32,
    /// Admission date, `DD-MM-YYYY`
    pub date: String,
    /// Whether the patient was admitted as an inpatient
    pub admitted: bool,
    /// Patient age in years
    pub age: u32,
    /// Patient sex (0/1 per the upstream coding)
    pub sex: u8,
    /// Patient region postal code
    pub region_code: u32,
    /// Screening symptom flags, fixed order
    pub symptoms: [bool; 4],
}

/// One health-secretariat case record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretariatCase {
    /// Confirmed-diagnosis flag
    pub diagnosis: bool,
    /// Vaccination flag
    pub vaccinated: bool,
    /// Case region postal code
    pub region_code: u32,
    /// Education level (0-5 per the upstream coding)
    pub education: u8,
    /// Population of the case's region
    pub population: u64,
    /// Notification date, `DD-MM-YYYY`
    pub date: String,
}

/// A decoded record, tagged with its source category.
///
/// Closed union: the decoder constructs exactly one variant per valid
/// inbound field-set, and each variant belongs to exactly one [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum Record {
    Who(WhoReport),
    Hospital(HospitalAdmission),
    Secretariat(SecretariatCase),
}

impl Record {
    /// The category this record belongs to.
    pub fn category(&self) -> Category {
        match self {
            Record::Who(_) => Category::Who,
            Record::Hospital(_) => Category::Hospital,
            Record::Secretariat(_) => Category::Secretariat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reports_its_category() {
        let rec = Record::Who(WhoReport {
            region_code: 11,
            deaths: 3,
            population: 120_000,
            recovered: 40,
            vaccinated: 90_000,
            date: "01-06-2025".to_string(),
        });
        assert_eq!(rec.category(), Category::Who);

        let rec = Record::Secretariat(SecretariatCase {
            diagnosis: true,
            vaccinated: false,
            region_code: 11002,
            education: 3,
            population: 50_000,
            date: "02-06-2025".to_string(),
        });
        assert_eq!(rec.category(), Category::Secretariat);
    }

    #[test]
    fn test_who_report_rejects_unknown_fields() {
        let result: Result<WhoReport, _> = serde_json::from_str(
            r#"{"region_code":11,"deaths":1,"population":100,"recovered":2,"vaccinated":50,"date":"01-06-2025","extra":true}"#,
        );
        assert!(result.is_err());
    }
}
