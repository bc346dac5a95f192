//! Cycle state: the shared accumulator and its completeness barrier.
//!
//! One aggregation cycle runs from the first accepted record after a reset
//! until all three categories hold at least one record. `CycleState` is the
//! single piece of shared mutable state in the gateway; the coordinator
//! wraps it in a mutex and every mutation happens inside one critical
//! section per batch. Nothing outside that critical section ever holds a
//! reference into the accumulated vectors — completion hands ownership out
//! via [`CycleState::complete_snapshot`].
//!
//! State machine per cycle:
//!
//! ```text
//! EMPTY --first append--> ACCUMULATING --all categories filled--> COMPLETE
//!   ^                                                               |
//!   +------------------- snapshot (drain + reset) ------------------+
//! ```
//!
//! Invariants:
//! - `cycle_start` is set if and only if at least one category is non-empty.
//! - Completeness is edge-triggered: `complete_snapshot` fires at most once
//!   per transition into COMPLETE, because taking the snapshot is what
//!   resets the state.
//! - After a reset the state is indistinguishable from a fresh one, except
//!   for the monotonically increasing cycle token.

use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::types::{Category, Record};

/// The shared, lock-protected accumulator for the current cycle.
#[derive(Debug)]
pub struct CycleState {
    /// Accumulated records, indexed by `Category::index()`.
    accumulated: [Vec<Record>; Category::COUNT],
    /// Monotonic start of the cycle, set on the first accepted record.
    cycle_start: Option<Instant>,
    /// Wall-clock start, for status reporting only.
    started_at: Option<DateTime<Utc>>,
    /// Monotonically increasing cycle identifier. The open (accumulating)
    /// cycle carries this token; each snapshot takes it and bumps it.
    token: u64,
}

/// Everything the dispatcher needs, drained out of the shared state at the
/// moment of completion. Owning this struct is the exclusive right to run
/// the external pipeline for this cycle.
#[derive(Debug)]
pub struct CycleSnapshot {
    /// Token of the completed cycle.
    pub token: u64,
    /// Monotonic start, for latency measurement.
    pub started: Instant,
    /// Wall-clock start, for reporting.
    pub started_at: DateTime<Utc>,
    /// Accumulated records, indexed by `Category::index()`; every entry is
    /// non-empty by construction.
    pub records: [Vec<Record>; Category::COUNT],
}

impl CycleSnapshot {
    /// Records for one category.
    pub fn records_for(&self, category: Category) -> &[Record] {
        &self.records[category.index()]
    }

    /// Total records across all categories.
    pub fn total_records(&self) -> usize {
        self.records.iter().map(Vec::len).sum()
    }
}

impl CycleState {
    pub fn new() -> Self {
        Self {
            accumulated: Default::default(),
            cycle_start: None,
            started_at: None,
            token: 1,
        }
    }

    /// Append decoded records to a category's list.
    ///
    /// Sets `cycle_start` when this is the first accepted record of an
    /// otherwise-empty cycle. Appending an empty slice is a no-op and in
    /// particular does not start a cycle (a batch whose records were all
    /// skipped must leave the state untouched).
    pub fn append(&mut self, category: Category, records: Vec<Record>) -> usize {
        if records.is_empty() {
            return 0;
        }

        if self.cycle_start.is_none() {
            self.cycle_start = Some(Instant::now());
            self.started_at = Some(Utc::now());
        }

        let list = &mut self.accumulated[category.index()];
        let appended = records.len();
        list.extend(records);
        appended
    }

    /// The completeness barrier: every required category is non-empty.
    pub fn is_complete(&self) -> bool {
        self.accumulated.iter().all(|list| !list.is_empty())
    }

    /// Edge-triggered completion: if the cycle is complete, drain it into a
    /// snapshot, reset the state for the next cycle, and bump the token.
    ///
    /// Returns `None` while any category is still empty. At most one caller
    /// can ever receive a snapshot for a given completing transition — the
    /// drain is what resets the barrier.
    pub fn complete_snapshot(&mut self) -> Option<CycleSnapshot> {
        if !self.is_complete() {
            return None;
        }

        let token = self.token;
        let started = self.cycle_start.take()?;
        let started_at = self.started_at.take().unwrap_or_else(Utc::now);
        let records = std::mem::take(&mut self.accumulated);

        self.token += 1;

        Some(CycleSnapshot {
            token,
            started,
            started_at,
            records,
        })
    }

    /// Clear all accumulated state, returning to EMPTY.
    ///
    /// Idempotent; resetting an already-empty cycle is a no-op. Normal
    /// operation resets through `complete_snapshot`, so this is only for
    /// administrative paths.
    pub fn reset(&mut self) {
        for list in &mut self.accumulated {
            list.clear();
        }
        self.cycle_start = None;
        self.started_at = None;
    }

    /// True when no category has accumulated anything.
    pub fn is_empty(&self) -> bool {
        self.accumulated.iter().all(Vec::is_empty)
    }

    /// Per-category record counts in canonical order.
    pub fn fill(&self) -> [usize; Category::COUNT] {
        let mut counts = [0; Category::COUNT];
        for (i, list) in self.accumulated.iter().enumerate() {
            counts[i] = list.len();
        }
        counts
    }

    /// Token of the currently accumulating cycle.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Wall-clock start of the open cycle, if one has begun.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HospitalAdmission, SecretariatCase, WhoReport};

    fn who_record() -> Record {
        Record::Who(WhoReport {
            region_code: 11,
            deaths: 2,
            population: 100_000,
            recovered: 30,
            vaccinated: 60_000,
            date: "01-06-2025".to_string(),
        })
    }

    fn hospital_record() -> Record {
        Record::Hospital(HospitalAdmission {
            hospital_id: 1,
            date: "01-06-2025".to_string(),
            admitted: true,
            age: 40,
            sex: 0,
            region_code: 11001,
            symptoms: [false, true, false, false],
        })
    }

    fn secretariat_record() -> Record {
        Record::Secretariat(SecretariatCase {
            diagnosis: true,
            vaccinated: true,
            region_code: 11002,
            education: 2,
            population: 100_000,
            date: "01-06-2025".to_string(),
        })
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = CycleState::new();
        assert!(state.is_empty());
        assert!(!state.is_complete());
        assert!(state.started_at().is_none());
        assert_eq!(state.fill(), [0, 0, 0]);
    }

    #[test]
    fn test_first_append_starts_cycle() {
        let mut state = CycleState::new();
        let appended = state.append(Category::Who, vec![who_record()]);
        assert_eq!(appended, 1);
        assert!(state.started_at().is_some());
        assert!(!state.is_complete());
        assert_eq!(state.fill(), [1, 0, 0]);
    }

    #[test]
    fn test_empty_append_does_not_start_cycle() {
        let mut state = CycleState::new();
        assert_eq!(state.append(Category::Who, Vec::new()), 0);
        assert!(state.is_empty());
        assert!(state.started_at().is_none());
    }

    #[test]
    fn test_barrier_requires_all_categories() {
        let mut state = CycleState::new();
        state.append(Category::Who, vec![who_record()]);
        state.append(Category::Hospital, vec![hospital_record()]);
        assert!(!state.is_complete());
        assert!(state.complete_snapshot().is_none());

        state.append(Category::Secretariat, vec![secretariat_record()]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_snapshot_drains_and_resets() {
        let mut state = CycleState::new();
        state.append(Category::Who, vec![who_record(), who_record()]);
        state.append(Category::Hospital, vec![hospital_record()]);
        state.append(Category::Secretariat, vec![secretariat_record()]);

        let snapshot = state.complete_snapshot().unwrap();
        assert_eq!(snapshot.token, 1);
        assert_eq!(snapshot.records_for(Category::Who).len(), 2);
        assert_eq!(snapshot.records_for(Category::Hospital).len(), 1);
        assert_eq!(snapshot.total_records(), 4);

        // State is back to EMPTY; the barrier cannot re-fire.
        assert!(state.is_empty());
        assert!(state.started_at().is_none());
        assert!(state.complete_snapshot().is_none());
        assert_eq!(state.token(), 2);
    }

    #[test]
    fn test_snapshot_fires_once_per_transition() {
        let mut state = CycleState::new();
        state.append(Category::Who, vec![who_record()]);
        state.append(Category::Hospital, vec![hospital_record()]);
        state.append(Category::Secretariat, vec![secretariat_record()]);

        assert!(state.complete_snapshot().is_some());
        assert!(state.complete_snapshot().is_none());

        // A new partial cycle does not trip the barrier either.
        state.append(Category::Who, vec![who_record()]);
        assert!(state.complete_snapshot().is_none());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut state = CycleState::new();
        state.append(Category::Who, vec![who_record()]);
        state.reset();
        assert!(state.is_empty());
        assert!(state.started_at().is_none());

        // Second reset is a no-op.
        state.reset();
        assert!(state.is_empty());
        assert!(state.started_at().is_none());
    }

    #[test]
    fn test_appends_are_additive_within_category() {
        let mut state = CycleState::new();
        state.append(Category::Hospital, vec![hospital_record()]);
        state.append(Category::Hospital, vec![hospital_record(), hospital_record()]);
        assert_eq!(state.fill()[Category::Hospital.index()], 3);
    }

    #[test]
    fn test_token_survives_manual_reset() {
        let mut state = CycleState::new();
        state.append(Category::Who, vec![who_record()]);
        state.append(Category::Hospital, vec![hospital_record()]);
        state.append(Category::Secretariat, vec![secretariat_record()]);
        let _ = state.complete_snapshot();
        state.reset();
        assert_eq!(state.token(), 2);
    }
}
