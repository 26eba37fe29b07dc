// crates/pavilion-orchestrator/src/series.rs
// ============================================================================
// Module: Series Repeat Lifecycle
// Description: Lazy repeat generation and completion detection for a
//              series, layered on `pavilion_core::Series`'s own gating.
// Purpose: Give the orchestrator the two series-level guarantees of §4.7:
//          a later repeat is never created before the prior one has begun,
//          and a series is marked `Complete` only once every run it has
//          created has reached a terminal state.
// Dependencies: pavilion-core
// ============================================================================

use pavilion_core::RunId;
use pavilion_core::Series;
use pavilion_core::SeriesStatus;
use pavilion_core::series::TestSetDef;

/// The test sets to resolve for one freshly-begun repeat.
#[derive(Debug, Clone)]
pub struct RepeatPlan {
    /// 0-indexed repeat number this plan belongs to.
    pub repeat_index: u32,
    /// The series's test-set definitions, cloned for this repeat.
    pub test_sets: Vec<TestSetDef>,
}

/// Begins the next repeat if the series allows it (not cancelled, and not
/// every requested repeat has started yet), returning the test sets to
/// resolve. Returns `None` when no further repeat should be started.
pub fn begin_next_repeat(series: &mut Series) -> Option<RepeatPlan> {
    if !series.can_start_next_repeat() {
        return None;
    }
    let repeat_index = series.repeats_started;
    series.begin_repeat();
    Some(RepeatPlan { repeat_index, test_sets: series.test_sets.clone() })
}

/// Records newly created run ids against the series, in creation order.
pub fn record_runs(series: &mut Series, run_ids: impl IntoIterator<Item = RunId>) {
    series.runs.extend(run_ids);
}

/// Marks the series `Complete` if every repeat has begun and every run it
/// has created is terminal, per `is_terminal`. A cancelled series is left
/// untouched: cancellation is a one-way transition applied elsewhere.
pub fn mark_complete_if_finished(series: &mut Series, is_terminal: impl Fn(RunId) -> bool) {
    if series.status == SeriesStatus::Cancelled {
        return;
    }
    let every_repeat_started = series.repeats_started >= series.repeat_count;
    let every_run_terminal = series.runs.iter().all(|id| is_terminal(*id));
    if every_repeat_started && every_run_terminal && !series.runs.is_empty() {
        series.status = SeriesStatus::Complete;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::Label;
    use pavilion_core::SeriesId;

    fn series(repeat_count: u32) -> Series {
        Series::new(SeriesId::from_raw(1).unwrap(), Label::new("default"), vec![TestSetDef { test_names: vec!["a".to_string()] }], repeat_count)
    }

    #[test]
    fn begin_next_repeat_stops_once_all_requested_repeats_started() {
        let mut s = series(2);
        assert!(begin_next_repeat(&mut s).is_some());
        assert!(begin_next_repeat(&mut s).is_some());
        assert!(begin_next_repeat(&mut s).is_none());
    }

    #[test]
    fn completion_requires_every_repeat_and_every_run_terminal() {
        let mut s = series(1);
        begin_next_repeat(&mut s);
        record_runs(&mut s, vec![RunId::from_raw(1).unwrap(), RunId::from_raw(2).unwrap()]);
        mark_complete_if_finished(&mut s, |_| false);
        assert_eq!(s.status, SeriesStatus::Running);
        mark_complete_if_finished(&mut s, |_| true);
        assert_eq!(s.status, SeriesStatus::Complete);
    }

    #[test]
    fn cancelled_series_is_never_reclassified_complete() {
        let mut s = series(1);
        begin_next_repeat(&mut s);
        record_runs(&mut s, vec![RunId::from_raw(1).unwrap()]);
        s.cancel();
        mark_complete_if_finished(&mut s, |_| true);
        assert_eq!(s.status, SeriesStatus::Cancelled);
    }
}
