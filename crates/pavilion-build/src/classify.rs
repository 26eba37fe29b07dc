// crates/pavilion-build/src/classify.rs
// ============================================================================
// Module: Source Classification
// Description: Classifies an acquired source path by file-magic, never by
//              extension.
// Purpose: Decide whether the build engine extracts, copies, or recurses
//          into the resolved source.
// Dependencies: infer, std::fs
// ============================================================================

//! ## Overview
//! [`classify`] inspects the first bytes of a file (or the path's metadata,
//! for a directory) and returns a [`SourceKind`]. Extensions are never
//! consulted; `source_download_name` or `source_path` may lie about the
//! actual content.

use std::fs;
use std::path::Path;

use crate::error::BuildEngineError;

/// The magic-sniffed shape of an acquired source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A directory, copied recursively.
    Directory,
    /// A gzip-compressed tar archive (or bare gzip stream).
    Gzip,
    /// A bzip2-compressed tar archive.
    Bzip2,
    /// An xz-compressed tar archive.
    Xz,
    /// An uncompressed POSIX tar archive.
    Tar,
    /// A zip archive.
    Zip,
    /// A plain file, copied verbatim.
    Plain,
}

impl SourceKind {
    /// Returns `true` for every archive kind this module can extract.
    #[must_use]
    pub const fn is_archive(self) -> bool {
        !matches!(self, Self::Directory | Self::Plain)
    }
}

/// Classifies `path` by reading its leading bytes (magic numbers), never its
/// extension.
///
/// # Errors
///
/// Returns [`BuildEngineError::Io`] if `path` cannot be read.
pub fn classify(path: &Path) -> Result<SourceKind, BuildEngineError> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() {
        return Ok(SourceKind::Directory);
    }

    let mut header = [0_u8; 264];
    let read = {
        use std::io::Read;
        let mut file = fs::File::open(path)?;
        let mut total = 0;
        while total < header.len() {
            let n = file.read(&mut header[total ..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        total
    };
    let header = &header[.. read];

    if infer::archive::is_gz(header) {
        return Ok(SourceKind::Gzip);
    }
    if infer::archive::is_bz2(header) {
        return Ok(SourceKind::Bzip2);
    }
    if infer::archive::is_xz(header) {
        return Ok(SourceKind::Xz);
    }
    if infer::archive::is_zip(header) {
        return Ok(SourceKind::Zip);
    }
    if is_posix_tar(header) {
        return Ok(SourceKind::Tar);
    }
    Ok(SourceKind::Plain)
}

/// POSIX tar has no leading magic at offset 0; the `ustar` signature sits at
/// byte 257. A bare (non-`ustar`) tar is only reliably identified by trying
/// to read an entry, which [`crate::extract`] already does as a fallback, so
/// this check only catches the common `ustar` case.
fn is_posix_tar(header: &[u8]) -> bool {
    header.len() >= 262 && &header[257 .. 262] == b"ustar"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classifies_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(classify(dir.path()).unwrap(), SourceKind::Directory);
    }

    #[test]
    fn classifies_gzip_by_magic_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&[0x1f, 0x8b, 0x08, 0x00]).unwrap();
        assert_eq!(classify(&path).unwrap(), SourceKind::Gzip);
    }

    #[test]
    fn classifies_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README");
        fs::write(&path, b"hello world").unwrap();
        assert_eq!(classify(&path).unwrap(), SourceKind::Plain);
    }
}
