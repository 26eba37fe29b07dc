// crates/pavilion-core/src/ident.rs
// ============================================================================
// Module: Pavilion Identifiers
// Description: Canonical opaque identifiers for labels, runs, series, and builds.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers used throughout the test-lifecycle engine. Numeric identifiers
//! enforce non-zero, 1-based invariants at construction boundaries so they can
//! be rendered directly into directory names without extra validation at each
//! call site.

use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;

/// Label namespace identifier: the working directory plus its labeled config
/// root. Test run ids are only unique *within* one label.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Creates a new label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Test run identifier, unique within a label namespace.
///
/// # Invariants
/// - Always >= 1 (non-zero, 1-based), matching the `test_runs/<id>` directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(NonZeroU64);

impl RunId {
    /// Creates a run identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates a run identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns the namespaced identifier string `<label>.<id>`.
    #[must_use]
    pub fn namespaced(self, label: &Label) -> String {
        format!("{label}.{id}", id = self.get())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

/// Series identifier, unique within a label namespace.
///
/// # Invariants
/// - Always >= 1 (non-zero, 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(NonZeroU64);

impl SeriesId {
    /// Creates a series identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates a series identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

/// Test base-name as it appears as a key in a suite map.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestName(String);

impl TestName {
    /// Creates a new test base-name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TestName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TestName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Content hash over a build's inputs, keying its artifact directory.
///
/// # Invariants
/// - `digest` is a lowercase hex string.
/// - `generation` is `0` for the first build at a given digest, and `N` for
///   the directory named `<digest>-<N+1>` (an operator-forced rebuild).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildHash {
    /// Lowercase hex digest of the canonical hash input.
    pub digest: String,
    /// Rebuild generation; `0` means the bare digest directory.
    pub generation: u32,
}

impl BuildHash {
    /// Creates a build hash at generation 0.
    #[must_use]
    pub const fn new(digest: String) -> Self {
        Self {
            digest,
            generation: 0,
        }
    }

    /// Returns the directory name for this hash (`<digest>` or `<digest>-N`).
    #[must_use]
    pub fn dir_name(&self) -> String {
        if self.generation == 0 {
            self.digest.clone()
        } else {
            format!("{}-{}", self.digest, self.generation + 1)
        }
    }

    /// Returns the next generation of this hash, for a forced rebuild.
    #[must_use]
    pub fn next_generation(&self) -> Self {
        Self {
            digest: self.digest.clone(),
            generation: self.generation + 1,
        }
    }
}

impl fmt::Display for BuildHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}

/// Deterministic chunk identifier, assigned `0, 1, 2, ...` in filter order.
///
/// # Invariants
/// - Stable for a given filtered node list, chunk size, and selection discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub u32);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_rejects_zero() {
        assert!(RunId::from_raw(0).is_none());
        assert_eq!(RunId::from_raw(1).unwrap().get(), 1);
    }

    #[test]
    fn run_id_namespaced_format() {
        let label = Label::new("default");
        let run = RunId::from_raw(42).unwrap();
        assert_eq!(run.namespaced(&label), "default.42");
    }

    #[test]
    fn build_hash_dir_name_generations() {
        let base = BuildHash::new("abc123".to_string());
        assert_eq!(base.dir_name(), "abc123");
        let next = base.next_generation();
        assert_eq!(next.dir_name(), "abc123-2");
        assert_eq!(next.next_generation().dir_name(), "abc123-3");
    }
}
