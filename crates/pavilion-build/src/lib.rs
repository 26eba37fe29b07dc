// crates/pavilion-build/src/lib.rs
// ============================================================================
// Crate: pavilion-build
// Description: The Build Engine: source acquisition, classification,
//              extraction, content hashing, cross-process locking, script
//              execution, and per-run symlink copy.
// Purpose: Turn one test spec's `build` section into a shared, reusable
//          build artifact, and a per-run view of it.
// ============================================================================

//! # pavilion-build
//!
//! Implements the build engine's component design: acquire the source
//! ([`fetch`]), classify it by magic ([`classify`]), extract or copy it
//! ([`extract`]), compute the canonical content hash that keys its artifact
//! directory ([`hash`]), coordinate exclusive access to that directory
//! ([`lock`]), compose and run its shell script ([`script`]), and give each
//! test run a writable-overlay view of the shared result
//! ([`symlink_copy`]). [`coordinator::ensure_built`] wires these into one
//! entry point.

pub mod classify;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod hash;
pub mod lock;
pub mod script;
pub mod symlink_copy;

pub use classify::SourceKind;
pub use classify::classify;
pub use coordinator::BuildPaths;
pub use coordinator::ensure_built;
pub use error::BuildEngineError;
pub use hash::SourceDigest;
