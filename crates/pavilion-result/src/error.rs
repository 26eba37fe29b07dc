// crates/pavilion-result/src/error.rs
// ============================================================================
// Module: Result Pipeline Errors
// Description: Per-key failure reporting that does not abort the pipeline.
// Purpose: Let one parser's glob or regex failure surface in the result's
//          `errors` list while every other key still resolves normally.
// Dependencies: pavilion-core
// ============================================================================

//! ## Overview
//! [`KeyError`] is what ends up in the result JSON's top-level `errors`
//! list (§4.6: "Parse errors for an individual key produce an entry ... but
//! do not abort the rest"). [`PipelineError`] is reserved for failures that
//! genuinely abort the whole run (an unreadable primary log, a malformed
//! parser configuration) rather than one key.

use pavilion_core::ParseError;

/// One key's parse or evaluate failure, recorded without aborting the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyError {
    /// The result key this failure belongs to.
    pub key: String,
    /// Human-readable failure description.
    pub message: String,
}

impl KeyError {
    /// Creates a key error from a key name and message.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self { key: key.into(), message: message.into() }
    }
}

/// A failure that aborts the whole pipeline run rather than one key.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The run's working directory could not be read at all.
    #[error("cannot read run working directory: {0}")]
    WorkingDirectory(String),
    /// Parsing a result key failed in a way that must abort (reserved for
    /// future use; all current parser failures degrade to a [`KeyError`]).
    #[error(transparent)]
    Parse(#[from] ParseError),
}
