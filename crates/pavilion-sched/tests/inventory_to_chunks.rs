// crates/pavilion-sched/tests/inventory_to_chunks.rs
// ============================================================================
// Module: Inventory Normalization to Chunk Carving Integration
// Description: Chains scheduler resolution, raw inventory normalization,
//              state/group filtering, and chunk carving end to end.
// Purpose: Confirm the four modules a real dispatch path touches compose
//          without any one of them assuming a shape the others don't
//          actually produce.
// ============================================================================

//! ## Overview
//! `sinfo`'s pipe-separated text is normalized into a [`NodeInventory`],
//! filtered down to the nodes a test's `only_nodes`/`only_groups` would
//! accept, then carved into chunks — the same sequence the worker-pool
//! orchestrator runs per dispatch, minus the actual scheduler binary.

#![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

use pavilion_core::interfaces::AdvancedScheduler;
use pavilion_core::node::NodeState;
use pavilion_core::node::filter_nodes;
use pavilion_core::spec::ChunkResidual;
use pavilion_core::spec::ChunkingSpec;
use pavilion_core::spec::NodeCount;
use pavilion_core::spec::NodeSelection;
use pavilion_sched::carve;
use pavilion_sched::registry::with_builtin_advanced_schedulers;
use serde_json::Value;

const SINFO_TEXT: &str = "\
n[01-03]|idle|32|128000|batch
n[04-05]|alloc|32|128000|batch
n06|down|16|64000|gpu
n07|idle|16|64000|gpu
";

#[test]
fn normalized_inventory_filters_and_chunks_deterministically() {
    let registry = with_builtin_advanced_schedulers().unwrap();
    let slurm = registry.resolve("slurm").unwrap();

    let inventory = slurm.normalize(&Value::String(SINFO_TEXT.to_string())).unwrap();
    assert_eq!(inventory.len(), 7);
    assert_eq!(inventory["n02"].state, NodeState::Up);
    assert_eq!(inventory["n04"].state, NodeState::Allocated);
    assert_eq!(inventory["n06"].state, NodeState::Down);

    let filtered = filter_nodes(&inventory, &["up".to_string()], &["batch".to_string()]);
    assert_eq!(filtered, vec!["n01", "n02", "n03"]);

    let spec = ChunkingSpec {
        size: Some(NodeCount::Absolute(2)),
        node_selection: NodeSelection::Contiguous,
        residual: ChunkResidual::Backfill,
        ..ChunkingSpec::default()
    };
    let chunks = carve(&filtered, &spec).unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].nodes, vec!["n01", "n02", "n03"]);

    let again = carve(&filtered, &spec).unwrap();
    assert_eq!(chunks[0].nodes, again[0].nodes);
}

#[test]
fn gpu_group_filter_excludes_down_nodes() {
    let registry = with_builtin_advanced_schedulers().unwrap();
    let slurm = registry.resolve("slurm").unwrap();
    let inventory = slurm.normalize(&Value::String(SINFO_TEXT.to_string())).unwrap();

    let filtered = filter_nodes(&inventory, &["up".to_string()], &["gpu".to_string()]);
    assert_eq!(filtered, vec!["n07"]);

    let spec = ChunkingSpec {
        size: Some(NodeCount::All),
        ..ChunkingSpec::default()
    };
    let chunks = carve(&filtered, &spec).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].nodes, vec!["n07"]);
}
