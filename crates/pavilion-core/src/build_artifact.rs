// crates/pavilion-core/src/build_artifact.rs
// ============================================================================
// Module: Pavilion Build Artifact
// Description: The on-disk, content-hash-keyed build directory record.
// Purpose: Track build completion and deprecation independent of the build
//          engine's own locking and execution logic.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`BuildArtifact`] is a directory on shared storage keyed by a
//! [`crate::ident::BuildHash`]. It exists only if built; a sibling finished
//! marker exists only once the build completed successfully; a deprecated
//! artifact carries a deprecation marker and is never reused.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::ident::BuildHash;

/// Lifecycle state of a build artifact directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildArtifactState {
    /// The directory exists but the finished marker has not been written.
    InProgress,
    /// The finished marker is present; the artifact is safe to reuse.
    Finished,
    /// The artifact carries a deprecation marker and must not be reused.
    Deprecated,
}

/// A build artifact directory and its hash identity.
///
/// # Invariants
/// - `root` is always `<working>/builds/<hash.dir_name()>`.
/// - `state` transitions `InProgress -> Finished` exactly once, or
///   `InProgress -> Deprecated`/`Finished -> Deprecated`, never backward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildArtifact {
    /// The content hash keying this artifact.
    pub hash: BuildHash,
    /// Root directory of the artifact, relative to the builds directory's
    /// parent (the Pavilion working directory).
    pub root: PathBuf,
    /// Current lifecycle state.
    pub state: BuildArtifactState,
}

impl BuildArtifact {
    /// Creates an in-progress artifact record rooted under `builds_dir`.
    #[must_use]
    pub fn new_in_progress(builds_dir: &Path, hash: BuildHash) -> Self {
        let root = builds_dir.join(hash.dir_name());
        Self {
            hash,
            root,
            state: BuildArtifactState::InProgress,
        }
    }

    /// Returns the sibling finished-marker path for this artifact.
    #[must_use]
    pub fn finished_marker_path(&self) -> PathBuf {
        let mut marker = self.root.clone();
        marker.set_extension("finished");
        marker
    }

    /// Returns the sentinel lock path used for exclusive-create acquisition.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root
            .parent()
            .map_or_else(|| PathBuf::from(format!(".{}.lock", self.hash.dir_name())), |parent| {
                parent.join(format!(".{}.lock", self.hash.dir_name()))
            })
    }

    /// Returns `true` when the artifact may be reused by a new test run.
    #[must_use]
    pub fn is_reusable(&self) -> bool {
        matches!(self.state, BuildArtifactState::Finished)
    }

    /// Marks the artifact finished.
    pub fn mark_finished(&mut self) {
        self.state = BuildArtifactState::Finished;
    }

    /// Marks the artifact deprecated; it is permanently excluded from reuse.
    pub fn mark_deprecated(&mut self) {
        self.state = BuildArtifactState::Deprecated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_marker_is_sibling_of_root() {
        let artifact =
            BuildArtifact::new_in_progress(Path::new("/work/builds"), BuildHash::new("abc".to_string()));
        assert_eq!(artifact.root, PathBuf::from("/work/builds/abc"));
        assert_eq!(artifact.finished_marker_path(), PathBuf::from("/work/builds/abc.finished"));
    }

    #[test]
    fn deprecated_artifacts_are_never_reusable() {
        let mut artifact =
            BuildArtifact::new_in_progress(Path::new("/work/builds"), BuildHash::new("abc".to_string()));
        artifact.mark_finished();
        assert!(artifact.is_reusable());
        artifact.mark_deprecated();
        assert!(!artifact.is_reusable());
    }
}
