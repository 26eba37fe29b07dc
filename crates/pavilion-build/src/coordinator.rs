// crates/pavilion-build/src/coordinator.rs
// ============================================================================
// Module: Build Coordinator
// Description: Orchestrates source acquisition, hashing, locking, execution,
//              and per-run symlink copy into the end-to-end build engine.
// Purpose: The single entry point callers (the orchestrator's worker pool)
//          use to get a finished, reusable build artifact for a test run.
// Dependencies: pavilion-core, crate::{classify,extract,fetch,hash,lock,
//               script,symlink_copy,error}
// ============================================================================

//! ## Overview
//! [`ensure_built`] implements §4.3 end to end: compose the script, acquire
//! the source, compute the canonical hash, and either reuse a finished
//! artifact or build it under the exclusive lock. Callers with two runs that
//! hash identically naturally coalesce onto the same artifact, since the
//! second caller observes the finished marker before (or just after)
//! acquiring the lock.

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;

use pavilion_core::BuildArtifact;
use pavilion_core::BuildSpec;
use pavilion_core::interfaces::ModuleWrapper;
use pavilion_core::interfaces::Registry;

use crate::classify;
use crate::classify::SourceKind;
use crate::error::BuildEngineError;
use crate::extract;
use crate::fetch;
use crate::hash;
use crate::hash::SourceDigest;
use crate::lock;
use crate::script;

/// Shared-storage paths the build engine reads and writes under.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    /// `<working>/builds/`.
    pub builds_dir: PathBuf,
    /// `<working>/downloads/`.
    pub downloads_dir: PathBuf,
    /// Configured `test_src` search directories, first match wins.
    pub test_src_dirs: Vec<PathBuf>,
}

/// Ensures a finished build artifact exists for `spec`, building it if no
/// matching hash has already completed.
///
/// # Errors
///
/// Returns [`BuildEngineError`] on any fetch, extraction, locking, or script
/// failure. A non-zero script exit is [`BuildEngineError::ScriptFailed`].
pub fn ensure_built(
    spec: &BuildSpec,
    paths: &BuildPaths,
    wrappers: &Registry<dyn ModuleWrapper>,
) -> Result<BuildArtifact, BuildEngineError> {
    let script_text = script::compose(&spec.modules, &spec.env, &spec.cmds, wrappers)?;

    let local_source = spec
        .source_path
        .as_deref()
        .map(|source_path| {
            fetch::acquire(
                source_path,
                spec.source_download_name.as_deref(),
                spec.source_download,
                &paths.test_src_dirs,
                &paths.downloads_dir,
            )
        })
        .transpose()?;

    let source_digest = match &local_source {
        Some(path) if classify::classify(path)? == SourceKind::Directory => {
            SourceDigest::DirMtime(extract::most_recent_mtime(path)?)
        }
        Some(path) => hash::read_source_bytes(path)?,
        None => SourceDigest::Bytes(Vec::new()),
    };

    let extra_file_pairs = read_extra_files(&spec.extra_files, &paths.test_src_dirs)?;
    let generated_file_pairs: Vec<(String, String)> = spec
        .create_files
        .iter()
        .map(|(path, lines)| (path.clone(), lines.join("\n")))
        .collect();

    let build_hash = hash::compute(
        &script_text,
        spec.specificity.as_deref().unwrap_or(""),
        &source_digest,
        &extra_file_pairs,
        &generated_file_pairs,
    );

    let mut artifact = BuildArtifact::new_in_progress(&paths.builds_dir, build_hash);
    if artifact.finished_marker_path().exists() {
        artifact.mark_finished();
        return Ok(artifact);
    }

    let log_path = artifact.root.join("build.log");
    let _guard = lock::acquire(
        &artifact.lock_path(),
        &log_path,
        Duration::from_secs(spec.timeout),
        &artifact.hash.dir_name(),
    )?;

    if artifact.finished_marker_path().exists() {
        artifact.mark_finished();
        return Ok(artifact);
    }

    build_in_place(
        spec,
        &artifact.root,
        local_source.as_deref(),
        &extra_file_pairs,
        &script_text,
        &log_path,
    )?;

    fs::File::create(artifact.finished_marker_path())?;
    artifact.mark_finished();
    Ok(artifact)
}

fn build_in_place(
    spec: &BuildSpec,
    build_dir: &Path,
    local_source: Option<&Path>,
    extra_files: &[(String, Vec<u8>)],
    script_text: &str,
    log_path: &Path,
) -> Result<(), BuildEngineError> {
    fs::create_dir_all(build_dir)?;

    if let Some(source) = local_source {
        let kind = classify::classify(source)?;
        let staging = build_dir.join(".staging");
        extract::materialize(source, kind, &staging, build_dir)?;
        let _ = fs::remove_dir_all(&staging);
    }

    for (relative, bytes) in extra_files {
        let dest = safe_join(build_dir, relative)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)?;
    }

    for (relative, lines) in &spec.create_files {
        let dest = safe_join(build_dir, relative)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(dest)?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
    }

    let script_path = build_dir.join("build.sh");
    fs::write(&script_path, script_text)?;

    let log_file = fs::File::create(log_path)?;
    let status = Command::new("sh")
        .arg(&script_path)
        .current_dir(build_dir)
        .stdout(Stdio::from(log_file.try_clone()?))
        .stderr(Stdio::from(log_file))
        .status()?;

    if !status.success() {
        return Err(BuildEngineError::ScriptFailed(status.code().unwrap_or(-1)));
    }

    make_read_only(build_dir)
}

fn safe_join(build_dir: &Path, relative: &str) -> Result<PathBuf, BuildEngineError> {
    if Path::new(relative).is_absolute() || relative.split('/').any(|segment| segment == "..") {
        return Err(BuildEngineError::PathEscape(relative.to_string()));
    }
    Ok(build_dir.join(relative))
}

fn read_extra_files(
    extra_files: &[String],
    test_src_dirs: &[PathBuf],
) -> Result<Vec<(String, Vec<u8>)>, BuildEngineError> {
    extra_files
        .iter()
        .map(|relative| {
            let resolved = fetch::resolve_local(relative, test_src_dirs)?;
            let bytes = fs::read(&resolved)?;
            Ok((relative.clone(), bytes))
        })
        .collect()
}

fn make_read_only(build_dir: &Path) -> Result<(), BuildEngineError> {
    for entry in walkdir::WalkDir::new(build_dir) {
        let entry = entry.map_err(|err| BuildEngineError::Io(err.to_string()))?;
        if entry.file_type().is_file() {
            let mut perms = entry.metadata().map_err(|err| BuildEngineError::Io(err.to_string()))?.permissions();
            perms.set_mode(perms.mode() & !0o222);
            fs::set_permissions(entry.path(), perms)?;
        }
    }
    Ok(())
}
