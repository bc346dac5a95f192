//! Core data model: source categories, typed records, inbound batches.

mod record;

pub use record::{HospitalAdmission, Record, SecretariatCase, WhoReport};

use serde::{Deserialize, Serialize};

// ============================================================================
// Category
// ============================================================================

/// A surveillance source category.
///
/// The set is closed: every inbound batch is tagged with exactly one of
/// these, and an aggregation cycle is complete once all three have
/// contributed at least one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Aggregate WHO-style situation reports (weekly counts per region)
    Who,
    /// Per-admission hospital records
    Hospital,
    /// Health-secretariat case records
    Secretariat,
}

impl Category {
    /// All categories in canonical order.
    ///
    /// This order is load-bearing: it fixes the artifact list handed to the
    /// external pipeline and the argv position of each artifact path.
    pub const ALL: [Category; 3] = [Category::Who, Category::Hospital, Category::Secretariat];

    /// Number of required categories per cycle.
    pub const COUNT: usize = Self::ALL.len();

    /// Wire tag for this category (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Who => "who",
            Category::Hospital => "hospital",
            Category::Secretariat => "secretariat",
        }
    }

    /// Parse a wire tag, case-insensitively.
    pub fn parse(tag: &str) -> Option<Category> {
        match tag.to_ascii_lowercase().as_str() {
            "who" => Some(Category::Who),
            "hospital" => Some(Category::Hospital),
            "secretariat" => Some(Category::Secretariat),
            _ => None,
        }
    }

    /// Stable index into per-category arrays (matches `ALL` order).
    pub fn index(&self) -> usize {
        match self {
            Category::Who => 0,
            Category::Hospital => 1,
            Category::Secretariat => 2,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Error for a category tag outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

// ============================================================================
// Batch
// ============================================================================

/// One inbound delivery: a category tag, an advisory source filename, and
/// the raw record field-sets to decode.
///
/// `filename` is diagnostic metadata only; it never participates in
/// aggregation logic.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBatch {
    pub category: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub records: Vec<serde_json::Value>,
}
