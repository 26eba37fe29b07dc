// crates/pavilion-build/src/error.rs
// ============================================================================
// Module: Build Engine Errors
// Description: Error taxonomy for source acquisition, extraction, hashing,
//              locking, and script execution.
// Purpose: Translate every build-stage failure into pavilion-core's Build
//          error kind rather than propagating library-specific errors.
// Dependencies: pavilion-core, thiserror
// ============================================================================

//! ## Overview
//! Every variant here converts into [`pavilion_core::error::BuildError`] so callers
//! outside this crate only ever see the shared taxonomy.

use pavilion_core::error::BuildError;
use thiserror::Error;

/// Errors raised while acquiring, hashing, or executing a build.
#[derive(Debug, Error)]
pub enum BuildEngineError {
    /// Source acquisition (local resolution or download) failed.
    #[error("source fetch failed: {0}")]
    Fetch(String),
    /// Archive extraction failed.
    #[error("extraction failed: {0}")]
    Extraction(String),
    /// The build script exited non-zero.
    #[error("build script exited with status {0}")]
    ScriptFailed(i32),
    /// The build lock was reclaimed after its holder stalled.
    #[error("build lock reclaimed after stall for hash '{0}'")]
    LockStallReclaimed(String),
    /// Underlying filesystem I/O failure.
    #[error("build i/o error: {0}")]
    Io(String),
    /// A `create_files` or `copy_files` path attempted to escape the build
    /// directory.
    #[error("path '{0}' escapes the build directory")]
    PathEscape(String),
}

impl From<std::io::Error> for BuildEngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<BuildEngineError> for BuildError {
    fn from(err: BuildEngineError) -> Self {
        match err {
            BuildEngineError::Fetch(msg) => Self::Fetch(msg),
            BuildEngineError::Extraction(msg) => Self::Extraction(msg),
            BuildEngineError::ScriptFailed(code) => Self::ScriptFailed(code),
            BuildEngineError::LockStallReclaimed(hash) => Self::LockStallReclaimed(hash),
            BuildEngineError::Io(msg) | BuildEngineError::PathEscape(msg) => Self::Io(msg),
        }
    }
}
