// crates/pavilion-build/src/extract.rs
// ============================================================================
// Module: Archive Extraction & Build Root Promotion
// Description: Extracts a classified source into a staging directory and
//              promotes its build root.
// Purpose: Turn an acquired, classified source into the build directory's
//          content, handling the "single top-level directory" collapse.
// Dependencies: pavilion-core, tar, flate2, bzip2, xz2, zip, walkdir
// ============================================================================

//! ## Overview
//! Archives extract into a staging directory; plain files and directories
//! are copied. If extraction yields exactly one top-level entry and it is a
//! directory, that directory's *contents* become the build root (the
//! wrapper directory itself is discarded); otherwise the staged contents
//! become the build root directly.

use std::fs;
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::classify::SourceKind;
use crate::error::BuildEngineError;

/// Extracts or copies `source` (already classified as `kind`) into
/// `staging`, then promotes the build root into `build_dir`.
///
/// # Errors
///
/// Returns [`BuildEngineError::Extraction`] or [`BuildEngineError::Io`] on
/// failure.
pub fn materialize(
    source: &Path,
    kind: SourceKind,
    staging: &Path,
    build_dir: &Path,
) -> Result<(), BuildEngineError> {
    fs::create_dir_all(staging)?;
    match kind {
        SourceKind::Directory => {
            copy_dir_recursive(source, staging)?;
        }
        SourceKind::Plain => {
            let name = source.file_name().ok_or_else(|| {
                BuildEngineError::Extraction("source path has no file name".to_string())
            })?;
            fs::copy(source, staging.join(name))?;
        }
        SourceKind::Gzip => {
            let file = fs::File::open(source)?;
            let mut archive = tar::Archive::new(GzDecoder::new(file));
            archive.unpack(staging).map_err(|err| BuildEngineError::Extraction(err.to_string()))?;
        }
        SourceKind::Bzip2 => {
            let file = fs::File::open(source)?;
            let mut archive = tar::Archive::new(BzDecoder::new(file));
            archive.unpack(staging).map_err(|err| BuildEngineError::Extraction(err.to_string()))?;
        }
        SourceKind::Xz => {
            let file = fs::File::open(source)?;
            let mut archive = tar::Archive::new(XzDecoder::new(file));
            archive.unpack(staging).map_err(|err| BuildEngineError::Extraction(err.to_string()))?;
        }
        SourceKind::Tar => {
            let file = fs::File::open(source)?;
            let mut archive = tar::Archive::new(file);
            archive.unpack(staging).map_err(|err| BuildEngineError::Extraction(err.to_string()))?;
        }
        SourceKind::Zip => {
            let file = fs::File::open(source)?;
            let mut archive =
                zip::ZipArchive::new(file).map_err(|err| BuildEngineError::Extraction(err.to_string()))?;
            archive.extract(staging).map_err(|err| BuildEngineError::Extraction(err.to_string()))?;
        }
    }

    promote_build_root(staging, build_dir)
}

/// Moves the staged content into `build_dir`, collapsing a single top-level
/// directory if extraction produced one.
fn promote_build_root(staging: &Path, build_dir: &Path) -> Result<(), BuildEngineError> {
    let mut entries: Vec<_> = fs::read_dir(staging)?.collect::<Result<_, _>>()?;
    fs::create_dir_all(build_dir)?;

    if entries.len() == 1 {
        let only = entries.remove(0);
        if only.file_type()?.is_dir() {
            move_dir_contents(&only.path(), build_dir)?;
            return Ok(());
        }
    }
    move_dir_contents(staging, build_dir)
}

fn move_dir_contents(from: &Path, to: &Path) -> Result<(), BuildEngineError> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        fs::rename(entry.path(), dest)?;
    }
    Ok(())
}

/// Recursively copies `source` into `dest`, preserving relative structure.
pub fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<(), BuildEngineError> {
    fs::create_dir_all(dest)?;
    for entry in walkdir::WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|err| BuildEngineError::Io(err.to_string()))?;
        let relative = entry.path().strip_prefix(source).map_err(|err| BuildEngineError::Io(err.to_string()))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Returns the most recent modification time under `dir`, used as a hash
/// input in place of source bytes when the source is a directory.
///
/// # Errors
///
/// Returns [`BuildEngineError::Io`] if the directory cannot be walked.
pub fn most_recent_mtime(dir: &Path) -> Result<std::time::SystemTime, BuildEngineError> {
    let mut latest = fs::metadata(dir)?.modified()?;
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.map_err(|err| BuildEngineError::Io(err.to_string()))?;
        let modified = entry.metadata().map_err(|err| BuildEngineError::Io(err.to_string()))?.modified()?;
        if modified > latest {
            latest = modified;
        }
    }
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_top_level_directory_is_collapsed() {
        let staging = tempfile::tempdir().unwrap();
        let wrapper = staging.path().join("pkg-1.0");
        fs::create_dir_all(&wrapper).unwrap();
        fs::write(wrapper.join("main.c"), b"int main(){}").unwrap();

        let build_dir = tempfile::tempdir().unwrap();
        let build_dir = build_dir.path().join("out");
        promote_build_root(staging.path(), &build_dir).unwrap();
        assert!(build_dir.join("main.c").exists());
        assert!(!build_dir.join("pkg-1.0").exists());
    }

    #[test]
    fn multiple_top_level_entries_stay_flat() {
        let staging = tempfile::tempdir().unwrap();
        fs::write(staging.path().join("a.c"), b"a").unwrap();
        fs::write(staging.path().join("b.c"), b"b").unwrap();

        let build_dir = tempfile::tempdir().unwrap();
        let build_dir = build_dir.path().join("out");
        promote_build_root(staging.path(), &build_dir).unwrap();
        assert!(build_dir.join("a.c").exists());
        assert!(build_dir.join("b.c").exists());
    }
}
