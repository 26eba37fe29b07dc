// crates/pavilion-orchestrator/src/cancel.rs
// ============================================================================
// Module: Cancellation Propagation
// Description: Idempotent run- and series-level cancel per §4.7/§5: sets
//              `Cancelled`, best-effort invokes the scheduler's cancel, and
//              always writes `RUN_COMPLETE`.
// Purpose: Guarantee a cancelled run is observably terminal to every host
//          even when the scheduler's own cancel call fails.
// Dependencies: pavilion-core
// ============================================================================

//! ## Overview
//! Per §7: "cancel failure is reported, run forced to `Cancelled` locally,
//! marker still written." [`cancel_run`] therefore never propagates a
//! scheduler cancel failure as an error; it only logs it.

use pavilion_core::RunState;
use pavilion_core::StatusEntry;
use pavilion_core::TestRun;
use pavilion_core::interfaces::Scheduler;

use crate::error::OrchestratorError;
use crate::rundir;
use crate::rundir::RunPaths;

/// Cancels a single run: idempotent no-op if already terminal, otherwise
/// appends `Cancelled` to the journal, best-effort cancels the scheduler
/// job if one was dispatched, and writes `RUN_COMPLETE`.
///
/// # Errors
///
/// Returns [`OrchestratorError`] if the journal append or the
/// `RUN_COMPLETE` write fails; a scheduler cancel failure is logged, not
/// returned.
pub fn cancel_run(
    paths: &RunPaths,
    run: &mut TestRun,
    now: time::OffsetDateTime,
    scheduler: Option<&dyn Scheduler>,
) -> Result<(), OrchestratorError> {
    if run.status.is_complete() {
        return rundir::mark_complete(paths);
    }

    rundir::append_status(paths, &mut run.status, StatusEntry::new(now, RunState::Cancelled, "cancelled by request"))?;

    if let Some(handle) = run.job_handle.as_ref()
        && let Some(scheduler) = scheduler
        && let Err(err) = scheduler.cancel(handle)
    {
        tracing::warn!(run = %run.id, error = %err, "scheduler cancel failed; run still forced to Cancelled");
    }

    run.run_complete = true;
    rundir::mark_complete(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::Label;
    use pavilion_core::RunId;
    use pavilion_core::TestSpec;

    fn ts() -> time::OffsetDateTime {
        time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn run() -> TestRun {
        TestRun::new(RunId::from_raw(1).unwrap(), Label::new("default"), "some_test", TestSpec::default())
    }

    #[test]
    fn cancel_is_idempotent_and_always_leaves_run_complete() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = run();
        let paths = RunPaths::new(dir.path(), r.id);
        rundir::ensure_dir(&paths).unwrap();

        cancel_run(&paths, &mut r, ts(), None).unwrap();
        assert_eq!(r.status.current().unwrap().state, RunState::Cancelled);
        assert!(rundir::is_complete(&paths));

        cancel_run(&paths, &mut r, ts(), None).unwrap();
        assert!(rundir::is_complete(&paths));
    }
}
