// crates/pavilion-build/src/hash.rs
// ============================================================================
// Module: Build Hash Computation
// Description: Computes the stable, canonical-ordering content hash that
//              keys a build's artifact directory.
// Purpose: Guarantee identical inputs produce an identical hash and any
//          single-bit change in any input changes it.
// Dependencies: pavilion-core, sha2
// ============================================================================

//! ## Overview
//! The hash input is, in order: the normalized build script text, the
//! specificity string, the source digest (file bytes or most-recent
//! directory mtime), sorted `(path, bytes)` pairs for extra files, and
//! sorted `(path, content)` pairs for generated files. Every section is
//! length-prefixed so no input can bleed into an adjacent one.

use std::fs;
use std::path::Path;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use pavilion_core::BuildHash;
use sha2::Digest;
use sha2::Sha256;

use crate::error::BuildEngineError;

/// The source contribution to the hash: either the source file's bytes, or
/// (for directory sources) the most recent mtime under the tree.
#[derive(Debug, Clone)]
pub enum SourceDigest {
    /// Raw file bytes (archives and plain files).
    Bytes(Vec<u8>),
    /// Most-recent modification time across a directory tree.
    DirMtime(SystemTime),
}

/// Computes the canonical build hash from its ordered inputs.
#[must_use]
pub fn compute(
    script_text: &str,
    specificity: &str,
    source: &SourceDigest,
    extra_files: &[(String, Vec<u8>)],
    generated_files: &[(String, String)],
) -> BuildHash {
    let mut hasher = Sha256::new();
    feed(&mut hasher, script_text.as_bytes());
    feed(&mut hasher, specificity.as_bytes());
    feed(&mut hasher, &source_bytes(source));

    let mut extras: Vec<_> = extra_files.to_vec();
    extras.sort_by(|a, b| a.0.cmp(&b.0));
    feed(&mut hasher, &extras.len().to_le_bytes());
    for (path, bytes) in &extras {
        feed(&mut hasher, path.as_bytes());
        feed(&mut hasher, bytes);
    }

    let mut generated: Vec<_> = generated_files.to_vec();
    generated.sort_by(|a, b| a.0.cmp(&b.0));
    feed(&mut hasher, &generated.len().to_le_bytes());
    for (path, content) in &generated {
        feed(&mut hasher, path.as_bytes());
        feed(&mut hasher, content.as_bytes());
    }

    let digest = hasher.finalize();
    BuildHash::new(format!("{digest:x}"))
}

fn source_bytes(source: &SourceDigest) -> Vec<u8> {
    match source {
        SourceDigest::Bytes(bytes) => bytes.clone(),
        SourceDigest::DirMtime(time) => {
            let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
            since_epoch.as_nanos().to_le_bytes().to_vec()
        }
    }
}

/// Feeds one length-prefixed section into the running hash, so adjacent
/// sections cannot be confused for one another.
fn feed(hasher: &mut Sha256, section: &[u8]) {
    hasher.update(section.len().to_le_bytes());
    hasher.update(section);
}

/// Reads a source file's bytes for hashing.
///
/// # Errors
///
/// Returns [`BuildEngineError::Io`] if `path` cannot be read.
pub fn read_source_bytes(path: &Path) -> Result<SourceDigest, BuildEngineError> {
    Ok(SourceDigest::Bytes(fs::read(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_produce_identical_hash() {
        let a = compute("echo hi", "host-a", &SourceDigest::Bytes(vec![1, 2, 3]), &[], &[]);
        let b = compute("echo hi", "host-a", &SourceDigest::Bytes(vec![1, 2, 3]), &[], &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn single_bit_change_in_script_changes_hash() {
        let a = compute("echo hi", "host-a", &SourceDigest::Bytes(vec![1, 2, 3]), &[], &[]);
        let b = compute("echo Hi", "host-a", &SourceDigest::Bytes(vec![1, 2, 3]), &[], &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn extra_file_ordering_does_not_affect_hash() {
        let a = compute(
            "make",
            "",
            &SourceDigest::Bytes(vec![]),
            &[("a.h".to_string(), vec![1]), ("b.h".to_string(), vec![2])],
            &[],
        );
        let b = compute(
            "make",
            "",
            &SourceDigest::Bytes(vec![]),
            &[("b.h".to_string(), vec![2]), ("a.h".to_string(), vec![1])],
            &[],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn specificity_forces_distinctness() {
        let a = compute("make", "host-a", &SourceDigest::Bytes(vec![]), &[], &[]);
        let b = compute("make", "host-b", &SourceDigest::Bytes(vec![]), &[], &[]);
        assert_ne!(a, b);
    }
}
