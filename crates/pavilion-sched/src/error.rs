// crates/pavilion-sched/src/error.rs
// ============================================================================
// Module: Scheduler Engine Errors
// Description: Errors raised while carving chunks, composing kickoff
//              scripts, or driving the bundled reference scheduler, before
//              they are folded into the core scheduler error taxonomy.
// Purpose: Keep chunking/kickoff failure modes distinct from the plugin
//          trait's own `SchedulerError`, mapping into it at the boundary.
// Dependencies: pavilion-core, std::io
// ============================================================================

use pavilion_core::SchedulerError;

/// Errors internal to this crate's chunking, kickoff, and reference
/// scheduler machinery.
#[derive(Debug, thiserror::Error)]
pub enum SchedEngineError {
    /// A requested chunk size did not resolve to at least one node.
    #[error("chunk size '{0}' yields no nodes from the filtered inventory")]
    EmptyChunk(String),
    /// The filtered inventory was empty before chunking was attempted.
    #[error("filtered inventory is empty")]
    EmptyInventory,
    /// Composing or writing the kickoff script failed.
    #[error("kickoff script error: {0}")]
    Kickoff(String),
    /// The reference scheduler failed to launch or poll a process.
    #[error("reference scheduler I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SchedEngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<SchedEngineError> for SchedulerError {
    fn from(err: SchedEngineError) -> Self {
        match err {
            SchedEngineError::EmptyChunk(msg) => Self::SubmissionRejected(msg),
            SchedEngineError::EmptyInventory => {
                Self::SubmissionRejected("filtered inventory is empty".to_string())
            }
            SchedEngineError::Kickoff(msg) => Self::SubmissionRejected(msg),
            SchedEngineError::Io(msg) => Self::Unavailable(msg),
        }
    }
}
