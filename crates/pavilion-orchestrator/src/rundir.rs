// crates/pavilion-orchestrator/src/rundir.rs
// ============================================================================
// Module: Run Directory & State Machine Persistence
// Description: On-disk layout and crash-safe I/O for one test run's
//              working directory: the append-only status journal, the
//              atomic `RUN_COMPLETE` marker, and the job/result/config
//              side files.
// Purpose: The sole cross-host coordination surface for observing a run
//          (§4.4): any Pavilion process on any host can cheaply poll
//          `RUN_COMPLETE` or replay the status journal without talking to
//          another process.
// Dependencies: pavilion-core, serde_json, time
// ============================================================================

//! ## Overview
//! Each journal line is one JSON-encoded [`StatusEntry`], appended with a
//! single `O_APPEND` write so concurrent appenders from different hosts
//! never interleave a torn line (§5: "Status-file writes are append-only;
//! a reader may see intermediate states but never a torn entry"). A reader
//! observing `RUN_COMPLETE` is guaranteed the result JSON is already fully
//! written, since [`mark_complete`] is always called last.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use pavilion_core::JobHandle;
use pavilion_core::RunId;
use pavilion_core::StatusEntry;
use pavilion_core::StatusJournal;
use pavilion_core::state::JournalError;

use crate::error::OrchestratorError;

/// The well-known file and directory names inside `test_runs/<id>/`.
pub mod names {
    /// The append-only status journal.
    pub const STATUS: &str = "status";
    /// The resolved, fully-substituted test spec for this run.
    pub const CONFIG: &str = "config.json";
    /// The scheduler job handle, once dispatched.
    pub const JOB_ID: &str = "job_id";
    /// The build script.
    pub const BUILD_SCRIPT: &str = "build.sh";
    /// The unsubstituted run script template.
    pub const RUN_TEMPLATE: &str = "run.tmpl";
    /// The fully-substituted run script.
    pub const RUN_SCRIPT: &str = "run.sh";
    /// The primary run log, read by the result pipeline's default glob.
    pub const RUN_LOG: &str = "run.log";
    /// The build artifact symlink/copy for this run.
    pub const BUILD_DIR: &str = "build";
    /// The atomic terminal-state sentinel.
    pub const RUN_COMPLETE: &str = "RUN_COMPLETE";
    /// The finished result JSON document.
    pub const RESULT: &str = "result.json";
}

/// Resolved paths inside one test run's working directory.
#[derive(Debug, Clone)]
pub struct RunPaths {
    root: PathBuf,
}

impl RunPaths {
    /// Resolves `test_runs/<id>/` under `working_dir`.
    #[must_use]
    pub fn new(working_dir: &Path, id: RunId) -> Self {
        Self { root: working_dir.join("test_runs").join(id.to_string()) }
    }

    /// The run's own directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The append-only status journal file.
    #[must_use]
    pub fn status(&self) -> PathBuf {
        self.root.join(names::STATUS)
    }

    /// The resolved config snapshot.
    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.root.join(names::CONFIG)
    }

    /// The scheduler job handle file.
    #[must_use]
    pub fn job_id(&self) -> PathBuf {
        self.root.join(names::JOB_ID)
    }

    /// The run's primary log, the result pipeline's default glob target.
    #[must_use]
    pub fn run_log(&self) -> PathBuf {
        self.root.join(names::RUN_LOG)
    }

    /// The build artifact directory symlinked/copied in for this run.
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(names::BUILD_DIR)
    }

    /// The atomic terminal-state sentinel.
    #[must_use]
    pub fn run_complete(&self) -> PathBuf {
        self.root.join(names::RUN_COMPLETE)
    }

    /// The finished result JSON document.
    #[must_use]
    pub fn result(&self) -> PathBuf {
        self.root.join(names::RESULT)
    }
}

/// Creates the run directory if it does not already exist.
///
/// # Errors
///
/// Returns [`OrchestratorError::Io`] on a filesystem failure.
pub fn ensure_dir(paths: &RunPaths) -> Result<(), OrchestratorError> {
    fs::create_dir_all(paths.root())?;
    Ok(())
}

/// Appends one entry to the status journal with a single `O_APPEND` write.
///
/// # Errors
///
/// Returns [`OrchestratorError::IllegalTransition`] if the in-memory
/// `journal` rejects the transition, or [`OrchestratorError::Io`] on a
/// filesystem failure.
pub fn append_status(
    paths: &RunPaths,
    journal: &mut StatusJournal,
    entry: StatusEntry,
) -> Result<(), OrchestratorError> {
    journal.append(entry.clone()).map_err(OrchestratorError::from)?;
    let mut line = serde_json::to_string(&entry).map_err(|err| OrchestratorError::TornJournal(err.to_string()))?;
    line.push('\n');
    let mut file = fs::OpenOptions::new().create(true).append(true).open(paths.status())?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Replays the status journal from disk without re-validating monotonicity
/// (the file is trusted to have been written by [`append_status`] alone).
///
/// # Errors
///
/// Returns [`OrchestratorError::TornJournal`] if any line fails to parse as
/// a [`StatusEntry`], or [`OrchestratorError::Io`] if the file cannot be
/// read (an absent file is not an error: it yields an empty journal).
pub fn read_status(paths: &RunPaths) -> Result<StatusJournal, OrchestratorError> {
    let contents = match fs::read_to_string(paths.status()) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(StatusJournal::new()),
        Err(err) => return Err(err.into()),
    };
    let mut entries = Vec::new();
    for line in contents.lines().filter(|line| !line.trim().is_empty()) {
        let entry: StatusEntry =
            serde_json::from_str(line).map_err(|err| OrchestratorError::TornJournal(err.to_string()))?;
        entries.push(entry);
    }
    Ok(StatusJournal::from_entries(entries))
}

/// Atomically writes the `RUN_COMPLETE` sentinel. Idempotent: an existing
/// marker is left untouched rather than treated as a conflict.
///
/// # Errors
///
/// Returns [`OrchestratorError::Io`] on a filesystem failure other than
/// the marker already existing.
pub fn mark_complete(paths: &RunPaths) -> Result<(), OrchestratorError> {
    match fs::OpenOptions::new().write(true).create_new(true).open(paths.run_complete()) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Returns `true` if the `RUN_COMPLETE` sentinel is present, the cheap
/// cross-host "is this run still in play" check (§4.4).
#[must_use]
pub fn is_complete(paths: &RunPaths) -> bool {
    paths.run_complete().exists()
}

/// Writes the scheduler job handle to `job_id`.
///
/// # Errors
///
/// Returns [`OrchestratorError::Io`] on a filesystem failure.
pub fn write_job_handle(paths: &RunPaths, handle: &JobHandle) -> Result<(), OrchestratorError> {
    let contents = serde_json::to_string_pretty(handle).map_err(|err| OrchestratorError::Io(err.to_string()))?;
    fs::write(paths.job_id(), contents)?;
    Ok(())
}

/// Writes the finished result document to `result.json`.
///
/// # Errors
///
/// Returns [`OrchestratorError::Io`] on a filesystem failure.
pub fn write_result(paths: &RunPaths, result: &serde_json::Value) -> Result<(), OrchestratorError> {
    let contents = serde_json::to_string_pretty(result).map_err(|err| OrchestratorError::Io(err.to_string()))?;
    fs::write(paths.result(), contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::RunState;
    use pavilion_core::ident::RunId;

    fn run_id() -> RunId {
        RunId::from_raw(1).unwrap()
    }

    fn ts() -> time::OffsetDateTime {
        time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    #[test]
    fn append_and_replay_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), run_id());
        ensure_dir(&paths).unwrap();
        let mut journal = StatusJournal::new();
        append_status(&paths, &mut journal, StatusEntry::new(ts(), RunState::Created, "")).unwrap();
        append_status(&paths, &mut journal, StatusEntry::new(ts(), RunState::Resolved, "")).unwrap();

        let replayed = read_status(&paths).unwrap();
        assert_eq!(replayed.entries().len(), 2);
        assert_eq!(replayed.current().unwrap().state, RunState::Resolved);
    }

    #[test]
    fn missing_journal_replays_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), run_id());
        let replayed = read_status(&paths).unwrap();
        assert!(replayed.entries().is_empty());
    }

    #[test]
    fn illegal_transition_is_rejected_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), run_id());
        ensure_dir(&paths).unwrap();
        let mut journal = StatusJournal::new();
        append_status(&paths, &mut journal, StatusEntry::new(ts(), RunState::Complete, "")).unwrap();
        let err = append_status(&paths, &mut journal, StatusEntry::new(ts(), RunState::Running, "")).unwrap_err();
        assert!(matches!(err, OrchestratorError::IllegalTransition(JournalError::IllegalTransition { .. })));
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), run_id());
        ensure_dir(&paths).unwrap();
        mark_complete(&paths).unwrap();
        mark_complete(&paths).unwrap();
        assert!(is_complete(&paths));
    }
}
