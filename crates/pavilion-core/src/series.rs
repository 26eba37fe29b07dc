// crates/pavilion-core/src/series.rs
// ============================================================================
// Module: Pavilion Series
// Description: An ordered collection of test-set definitions submitted as
//              one unit, with a repeat count and its own status.
// Purpose: Let the worker-pool orchestrator track series-level progress and
//          cancellation independent of individual run state.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Series`] groups test-set definitions submitted together. Tests may be
//! created lazily (§4.7): a later repeat is not created until prior repeats
//! have at least begun.

use serde::Deserialize;
use serde::Serialize;

use crate::ident::Label;
use crate::ident::RunId;
use crate::ident::SeriesId;

/// One test-set definition within a series: the suite-relative test names to
/// resolve and run together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSetDef {
    /// Test base-names (possibly suite-qualified) to resolve.
    pub test_names: Vec<String>,
}

/// Series-level lifecycle status, independent of any one run's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStatus {
    /// No repeats have started yet.
    Pending,
    /// At least one repeat has begun and the series has not been stopped.
    Running,
    /// Every repeat reached a terminal run state.
    Complete,
    /// A series-level cancel was issued.
    Cancelled,
}

/// An ordered collection of test-set definitions submitted as one unit.
///
/// # Invariants
/// - `repeats_started <= repeat_count`.
/// - A later repeat's runs are not created until `repeats_started` reflects
///   that the prior repeat has at least begun.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    /// Series identifier, unique within `label`.
    pub id: SeriesId,
    /// Label namespace this series belongs to.
    pub label: Label,
    /// Test-set definitions, in submission order.
    pub test_sets: Vec<TestSetDef>,
    /// Number of times the full test-set list should run.
    pub repeat_count: u32,
    /// Number of repeats that have begun so far.
    pub repeats_started: u32,
    /// Runs created so far across all repeats, in creation order.
    pub runs: Vec<RunId>,
    /// Current series-level status.
    pub status: SeriesStatus,
}

impl Series {
    /// Creates a pending series with no runs yet created.
    #[must_use]
    pub fn new(id: SeriesId, label: Label, test_sets: Vec<TestSetDef>, repeat_count: u32) -> Self {
        Self {
            id,
            label,
            test_sets,
            repeat_count,
            repeats_started: 0,
            runs: Vec::new(),
            status: SeriesStatus::Pending,
        }
    }

    /// Returns `true` when another repeat may begin (all requested repeats
    /// have not yet started and the series has not been cancelled).
    #[must_use]
    pub fn can_start_next_repeat(&self) -> bool {
        self.repeats_started < self.repeat_count && self.status != SeriesStatus::Cancelled
    }

    /// Records that another repeat has begun.
    pub fn begin_repeat(&mut self) {
        self.repeats_started += 1;
        self.status = SeriesStatus::Running;
    }

    /// Marks the series cancelled; propagation to individual runs is the
    /// orchestrator's responsibility.
    pub fn cancel(&mut self) {
        self.status = SeriesStatus::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_repeat_gating() {
        let mut series = Series::new(SeriesId::from_raw(1).unwrap(), Label::new("default"), vec![], 3);
        assert!(series.can_start_next_repeat());
        series.begin_repeat();
        series.begin_repeat();
        assert_eq!(series.repeats_started, 2);
        assert!(series.can_start_next_repeat());
        series.begin_repeat();
        assert!(!series.can_start_next_repeat());
    }

    #[test]
    fn cancel_blocks_further_repeats() {
        let mut series = Series::new(SeriesId::from_raw(1).unwrap(), Label::new("default"), vec![], 5);
        series.cancel();
        assert!(!series.can_start_next_repeat());
    }
}
