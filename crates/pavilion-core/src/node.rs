// crates/pavilion-core/src/node.rs
// ============================================================================
// Module: Pavilion Node Inventory
// Description: Normalized node records and deterministic chunks, as produced
//              by an advanced scheduler's inventory normalization.
// Purpose: Give the scheduler abstraction a shared shape for filtering and
//          chunking independent of any one scheduler's native format.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`NodeRecord`] is the normalized shape every advanced scheduler plugin
//! must produce from its raw inventory. [`Chunk`] is a deterministic subset
//! of the filtered inventory, carved by [`crate::ident::ChunkId`].

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::ident::ChunkId;

/// Up/down/allocated state of a node, normalized across scheduler backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// The node is up and not currently allocated.
    Up,
    /// The node is up but allocated to a job.
    Allocated,
    /// The node is down or otherwise unusable.
    Down,
    /// The node is in an unrecognized or transitional native state.
    Unknown,
}

/// One node's normalized inventory record.
///
/// # Invariants
/// - Must accurately reflect what the underlying scheduler will honor;
///   disagreement causes jobs to hang or be rejected (enforcement is the
///   scheduler plugin's responsibility, not this type's).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Current up/down/allocated state.
    pub state: NodeState,
    /// Number of CPUs.
    pub cpus: u32,
    /// Memory, in bytes.
    pub memory_bytes: u64,
    /// Partitions and reservations this node belongs to.
    pub groups: BTreeSet<String>,
    /// Arbitrary scheduler-specific attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// The full normalized node inventory: name to record.
pub type NodeInventory = BTreeMap<String, NodeRecord>;

/// Filters an inventory by accepted states and accepted groups.
///
/// An empty `accept_states` accepts every state; an empty `accept_groups`
/// accepts every group. Returned names preserve inventory (map) order, which
/// is the "filter order" chunk ids are assigned against.
#[must_use]
pub fn filter_nodes<'a>(
    inventory: &'a NodeInventory,
    accept_states: &[String],
    accept_groups: &[String],
) -> Vec<&'a str> {
    inventory
        .iter()
        .filter(|(_, record)| {
            let state_ok = accept_states.is_empty()
                || accept_states.iter().any(|s| state_matches(record.state, s));
            let group_ok =
                accept_groups.is_empty() || accept_groups.iter().any(|g| record.groups.contains(g));
            state_ok && group_ok
        })
        .map(|(name, _)| name.as_str())
        .collect()
}

fn state_matches(state: NodeState, label: &str) -> bool {
    match label {
        "up" => matches!(state, NodeState::Up),
        "allocated" => matches!(state, NodeState::Allocated),
        "down" => matches!(state, NodeState::Down),
        "unknown" => matches!(state, NodeState::Unknown),
        _ => false,
    }
}

/// A deterministic subset of the filtered inventory.
///
/// # Invariants
/// - For a fixed filtered list, chunk size, and selection discipline, the
///   same `(id, nodes)` pair is produced every time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier, assigned `0, 1, 2, ...` in filter order.
    pub id: ChunkId,
    /// Node names belonging to this chunk, in filter order.
    pub nodes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: NodeState, groups: &[&str]) -> NodeRecord {
        NodeRecord {
            state,
            cpus: 32,
            memory_bytes: 1 << 30,
            groups: groups.iter().map(|g| (*g).to_string()).collect(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn filter_by_state_and_group() {
        let mut inventory = NodeInventory::new();
        inventory.insert("n1".to_string(), record(NodeState::Up, &["batch"]));
        inventory.insert("n2".to_string(), record(NodeState::Down, &["batch"]));
        inventory.insert("n3".to_string(), record(NodeState::Up, &["gpu"]));

        let filtered = filter_nodes(&inventory, &["up".to_string()], &["batch".to_string()]);
        assert_eq!(filtered, vec!["n1"]);
    }

    #[test]
    fn empty_filters_accept_everything() {
        let mut inventory = NodeInventory::new();
        inventory.insert("n1".to_string(), record(NodeState::Down, &[]));
        let filtered = filter_nodes(&inventory, &[], &[]);
        assert_eq!(filtered, vec!["n1"]);
    }
}
