// crates/pavilion-build/src/symlink_copy.rs
// ============================================================================
// Module: Per-Run Symlink Copy
// Description: Produces a per-test-run view of a shared build artifact.
// Purpose: Give every run an identical directory tree where regular files
//          are symlinks into the shared artifact, except paths named by
//          `copy_files`, which are copied as real, writable files.
// Dependencies: std::os::unix::fs, walkdir, glob
// ============================================================================

//! ## Overview
//! Builds occur in place so absolute rpaths stay valid; a run must not
//! mutate the shared artifact, so it works against a tree of symlinks
//! instead. `copy_files` patterns (`*`, `?`, `[...]`, `**`) mark paths the
//! test is expected to overwrite, which are copied as real files so the
//! symlink is never broken by the test's own writes.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use glob::Pattern;

use crate::error::BuildEngineError;

/// Creates `run_dir` as a symlink copy of `build_dir`: every regular file
/// becomes a symlink to the shared artifact, except paths matching
/// `copy_files`, which are copied as real, writable files.
///
/// # Errors
///
/// Returns [`BuildEngineError::Io`] on filesystem failure.
pub fn copy(build_dir: &Path, run_dir: &Path, copy_files: &[String]) -> Result<(), BuildEngineError> {
    let patterns: Vec<Pattern> = copy_files
        .iter()
        .filter_map(|pattern| Pattern::new(pattern).ok())
        .collect();

    fs::create_dir_all(run_dir)?;
    for entry in walkdir::WalkDir::new(build_dir).min_depth(1) {
        let entry = entry.map_err(|err| BuildEngineError::Io(err.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(build_dir)
            .map_err(|err| BuildEngineError::Io(err.to_string()))?;
        let target = run_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if matches_any(relative, &patterns) {
            fs::copy(entry.path(), &target)?;
        } else {
            let source_absolute = fs::canonicalize(entry.path())?;
            symlink(source_absolute, &target)?;
        }
    }
    Ok(())
}

fn matches_any(relative: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_files_become_symlinks() {
        let build_dir = tempfile::tempdir().unwrap();
        fs::write(build_dir.path().join("bin"), b"exe").unwrap();
        let run_dir = tempfile::tempdir().unwrap();
        let run_dir = run_dir.path().join("run");

        copy(build_dir.path(), &run_dir, &[]).unwrap();
        let meta = fs::symlink_metadata(run_dir.join("bin")).unwrap();
        assert!(meta.file_type().is_symlink());
    }

    #[test]
    fn copy_files_pattern_produces_real_writable_file() {
        let build_dir = tempfile::tempdir().unwrap();
        fs::write(build_dir.path().join("output.dat"), b"initial").unwrap();
        let run_dir = tempfile::tempdir().unwrap();
        let run_dir = run_dir.path().join("run");

        copy(build_dir.path(), &run_dir, &["output.dat".to_string()]).unwrap();
        let meta = fs::symlink_metadata(run_dir.join("output.dat")).unwrap();
        assert!(!meta.file_type().is_symlink());
        fs::write(run_dir.join("output.dat"), b"overwritten").unwrap();
        assert_eq!(fs::read(build_dir.path().join("output.dat")).unwrap(), b"initial");
    }
}
