// crates/pavilion-core/src/spec.rs
// ============================================================================
// Module: Pavilion Test Specification
// Description: The suite-map data model: test specs and their build/run/
//              schedule sub-sections, prior to resolution.
// Purpose: Give the resolver, build engine, and scheduler abstraction a
//          shared, typed view of an already-parsed suite map.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`SuiteMap`] is a mapping from test base-name to [`TestSpec`]. The YAML
//! loader that produces it is out of scope; these types accept an
//! already-parsed, `serde_json`-shaped suite map and give every downstream
//! component a typed view of the sections it cares about.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::variable::MappingEntry;

/// A suite map: test base-name to test spec.
pub type SuiteMap = BTreeMap<String, TestSpec>;

/// One test spec, as it appears in a suite map before resolution.
///
/// # Invariants
/// - `inherits_from`, if present, names another key in the same suite map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSpec {
    /// Name of another test spec in the same suite to inherit from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    /// Scheduler capability name used to dispatch this test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    /// Scheduler request parameters.
    #[serde(default)]
    pub schedule: ScheduleSpec,
    /// Build engine configuration.
    #[serde(default)]
    pub build: BuildSpec,
    /// The run script configuration.
    #[serde(default)]
    pub run: RunScript,
    /// Result parser configurations, keyed by result key.
    #[serde(default)]
    pub result_parse: BTreeMap<String, Value>,
    /// Ordered `key: expression` pairs evaluated after parsing.
    #[serde(default)]
    pub result_evaluate: Vec<(String, String)>,
    /// Raw, unresolved variable declarations.
    #[serde(default)]
    pub variables: BTreeMap<String, Vec<RawVarValue>>,
    /// Variable names to permute over.
    #[serde(default)]
    pub permute_on: Vec<String>,
    /// Conjunction of key/pattern-list conditions; all must match to proceed.
    #[serde(default)]
    pub only_if: BTreeMap<String, Vec<String>>,
    /// Disjunction of key/pattern-list conditions; any match skips the run.
    #[serde(default)]
    pub not_if: BTreeMap<String, Vec<String>>,
    /// Per-permutation title template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Attributes not otherwise recognized, preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A raw variable value as it appears in a suite map, before shape
/// validation promotes it to [`crate::variable::VarValue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawVarValue {
    /// A scalar string value.
    Scalar(String),
    /// A mapping value.
    Mapping(BTreeMap<String, MappingEntry>),
}

/// Build engine configuration for one test spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Relative path or URL to the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Override for the downloaded file's on-disk name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_download_name: Option<String>,
    /// Download policy for URL sources.
    #[serde(default)]
    pub source_download: DownloadPolicy,
    /// Paths copied into the build verbatim (never extracted).
    #[serde(default)]
    pub extra_files: Vec<String>,
    /// Path (inside the build dir) to an ordered sequence of lines to write.
    #[serde(default)]
    pub create_files: BTreeMap<String, Vec<String>>,
    /// Module load/unload/swap actions run before the build commands.
    #[serde(default)]
    pub modules: Vec<ModuleAction>,
    /// Environment variables exported before the build commands.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Shell commands composing the build script body.
    #[serde(default)]
    pub cmds: Vec<String>,
    /// Extra string mixed into the build hash to force distinctness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<String>,
    /// When true, the build script runs on the allocation, not the kickoff host.
    #[serde(default)]
    pub on_nodes: bool,
    /// Seconds of build-script silence before the lock is considered stalled.
    #[serde(default = "default_build_timeout")]
    pub timeout: u64,
}

const fn default_build_timeout() -> u64 {
    30
}

/// Download policy for URL sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadPolicy {
    /// Never download; the file must already be present.
    Never,
    /// Download only if missing locally (the default).
    #[default]
    Missing,
    /// Always re-download to pick up the latest version.
    Latest,
}

/// A module-environment action run in sequence before the script body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ModuleAction {
    /// `module load <name>`.
    Load {
        /// Module name, optionally versioned.
        name: String,
    },
    /// `module unload <name>`.
    Unload {
        /// Module name, optionally versioned.
        name: String,
    },
    /// `module swap <old> <new>`.
    Swap {
        /// Module being replaced.
        old: String,
        /// Module replacing it.
        new: String,
    },
}

/// The run script configuration for one test spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunScript {
    /// Module load/unload/swap actions run before the run commands.
    #[serde(default)]
    pub modules: Vec<ModuleAction>,
    /// Environment variables exported before the run commands.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Shell commands composing the run script body.
    #[serde(default)]
    pub cmds: Vec<String>,
}

/// A node count request: an absolute count, a percentage, or all available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeCount {
    /// An exact number of nodes.
    Absolute(u32),
    /// A percentage (0-100) of the filtered inventory.
    Percent(u32),
    /// Every node in the filtered inventory (or `cluster_info.node_count`
    /// for a basic scheduler).
    All,
}

impl Default for NodeCount {
    fn default() -> Self {
        Self::Absolute(1)
    }
}

/// Node-selection discipline used when carving chunks from filtered inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeSelection {
    /// Take nodes in filtered-list order (the default).
    #[default]
    Contiguous,
    /// Take every r-th node.
    Distributed,
    /// Take a seeded-random subset.
    Random,
    /// Random selection within distributed buckets.
    RandDist,
}

/// What to do with nodes left over after exact-size chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkResidual {
    /// Merge residual nodes into the second-to-last chunk (the default).
    #[default]
    Backfill,
    /// Drop residual nodes entirely.
    Discard,
}

/// Chunking parameters from the `chunking` sub-section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingSpec {
    /// Chunk size, absolute or percentage of the filtered inventory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<NodeCount>,
    /// Node-selection discipline.
    #[serde(default)]
    pub node_selection: NodeSelection,
    /// Extra, scheduler-specific chunking parameters.
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
    /// What to do with leftover nodes.
    #[serde(default)]
    pub residual: ChunkResidual,
}

/// Scheduler request parameters from the `schedule` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Requested node count.
    #[serde(default)]
    pub nodes: NodeCount,
    /// Minimum acceptable node count, if nodes is a range-tolerant request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_nodes: Option<NodeCount>,
    /// Tasks to run per node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_per_node: Option<u32>,
    /// Scheduler partition/queue name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Wall-clock time limit, in the scheduler's native format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<String>,
    /// Memory requested per node, in the scheduler's native format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_per_node: Option<String>,
    /// Whether this run may share an allocation with compatible runs.
    #[serde(default)]
    pub share_allocation: bool,
    /// Chunking parameters.
    #[serde(default)]
    pub chunking: ChunkingSpec,
    /// A specific chunk id to target, if chunking has already run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<u32>,
    /// Shell fragment inserted between the launcher and the user command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    /// Static node count for basic schedulers (no live inventory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_info_node_count: Option<u32>,
    /// Accepted node states for filtering (advanced schedulers only).
    #[serde(default)]
    pub accept_states: Vec<String>,
    /// Accepted scheduler groups (partitions/reservations) for filtering.
    #[serde(default)]
    pub accept_groups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_are_empty() {
        let spec = TestSpec::default();
        assert!(spec.inherits_from.is_none());
        assert!(spec.permute_on.is_empty());
        assert_eq!(spec.build.timeout, 30);
    }

    #[test]
    fn node_count_default_is_one() {
        assert_eq!(NodeCount::default(), NodeCount::Absolute(1));
    }
}
