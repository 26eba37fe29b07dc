// crates/pavilion-orchestrator/src/error.rs
// ============================================================================
// Module: Orchestrator Errors
// Description: Failures raised by run-directory I/O, journal replay, and
//              series-level coordination.
// Purpose: Fold into the shared `ConcurrencyError` kind at the crate
//          boundary, per §7 ("lock acquisition timeout, torn journal").
// Dependencies: pavilion-core, thiserror
// ============================================================================

use pavilion_core::ConcurrencyError;
use pavilion_core::state::JournalError;

/// Errors raised while persisting or replaying a run's on-disk state.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Filesystem I/O failure reading or writing the run directory.
    #[error("run directory i/o error: {0}")]
    Io(String),
    /// A status journal line could not be parsed as a status entry.
    #[error("torn status journal entry: {0}")]
    TornJournal(String),
    /// An append would move a terminal run backward.
    #[error(transparent)]
    IllegalTransition(#[from] JournalError),
    /// A series had no further repeats to start when one was requested.
    #[error("series {0} has no further repeats to start")]
    NoRepeatsRemaining(String),
}

impl From<std::io::Error> for OrchestratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<OrchestratorError> for ConcurrencyError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Io(msg) | OrchestratorError::NoRepeatsRemaining(msg) => {
                Self::TornJournal(msg)
            }
            OrchestratorError::TornJournal(msg) => Self::TornJournal(msg),
            OrchestratorError::IllegalTransition(err) => Self::TornJournal(err.to_string()),
        }
    }
}
