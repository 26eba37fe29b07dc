// crates/pavilion-build/tests/source_hash_to_artifact.rs
// ============================================================================
// Module: Source Acquisition to Build Artifact Integration
// Description: Chains local source resolution, content hashing, and
//              end-to-end artifact construction through the coordinator.
// Purpose: Confirm a real on-disk source file changes the build hash (and
//          therefore the artifact directory) the same way an empty source
//          does not, closing the gap the coordinator's own unit tests leave
//          by never exercising `source_path`.
// ============================================================================

//! ## Overview
//! `ensure_built`'s own tests cover reuse, failure, and `create_files` with
//! an empty source. This exercises the path those tests skip: a real file
//! resolved through `test_src_dirs`, fed through [`pavilion_build::hash`] as
//! part of the canonical build hash.

#![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

use std::fs;

use pavilion_build::BuildPaths;
use pavilion_build::ensure_built;
use pavilion_core::BuildSpec;
use pavilion_core::interfaces::ModuleWrapper;
use pavilion_core::interfaces::Registry;

fn spec_with_source(source_path: &str, cmds: Vec<String>) -> BuildSpec {
    BuildSpec {
        source_path: Some(source_path.to_string()),
        cmds,
        ..BuildSpec::default()
    }
}

#[test]
fn differing_source_content_produces_differing_artifacts() {
    let working = tempfile::tempdir().unwrap();
    let src_dir = working.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();
    fs::write(src_dir.join("program.c"), b"int main(void) { return 0; }").unwrap();

    let paths = BuildPaths {
        builds_dir: working.path().join("builds"),
        downloads_dir: working.path().join("downloads"),
        test_src_dirs: vec![src_dir.clone()],
    };
    let wrappers: Registry<dyn ModuleWrapper> = Registry::new();

    let spec = spec_with_source("program.c", vec!["test -f program.c".to_string()]);
    let first = ensure_built(&spec, &paths, &wrappers).unwrap();
    assert!(first.root.join("program.c").exists());

    fs::write(src_dir.join("program.c"), b"int main(void) { return 1; }").unwrap();
    let second = ensure_built(&spec, &paths, &wrappers).unwrap();

    assert_ne!(first.hash, second.hash);
    assert_ne!(first.root, second.root);
}

#[test]
fn rebuilding_identical_source_reuses_the_same_artifact() {
    let working = tempfile::tempdir().unwrap();
    let src_dir = working.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();
    fs::write(src_dir.join("program.c"), b"int main(void) { return 0; }").unwrap();

    let paths = BuildPaths {
        builds_dir: working.path().join("builds"),
        downloads_dir: working.path().join("downloads"),
        test_src_dirs: vec![src_dir],
    };
    let wrappers: Registry<dyn ModuleWrapper> = Registry::new();
    let spec = spec_with_source("program.c", vec!["touch built.marker".to_string()]);

    let first = ensure_built(&spec, &paths, &wrappers).unwrap();
    let second = ensure_built(&spec, &paths, &wrappers).unwrap();

    assert_eq!(first.hash, second.hash);
    assert_eq!(first.root, second.root);
}
