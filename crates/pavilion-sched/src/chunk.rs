// crates/pavilion-sched/src/chunk.rs
// ============================================================================
// Module: Chunk Carving
// Description: Partitions a filtered node list into deterministic chunks
//              per a node-selection discipline and residual policy.
// Purpose: Implement §4.5's chunking rules independent of any one scheduler
//          plugin's native inventory format.
// Dependencies: pavilion-core, sha2
// ============================================================================

//! ## Overview
//! Given the same filtered node list, chunk size, and
//! [`NodeSelection`] discipline, [`carve`] always returns the same chunks.
//! *Contiguous* and *distributed* are pure functions of filter order;
//! *random* and *rand-dist* seed their shuffle from the filtered list's
//! content, not wall-clock time, so the result is still reproducible.

use pavilion_core::ChunkId;
use pavilion_core::node::Chunk;
use pavilion_core::spec::ChunkResidual;
use pavilion_core::spec::ChunkingSpec;
use pavilion_core::spec::NodeCount;
use pavilion_core::spec::NodeSelection;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sha2::Digest;
use sha2::Sha256;

use crate::error::SchedEngineError;

/// Resolves a [`NodeCount`] to an absolute chunk size against the filtered
/// inventory's length.
#[must_use]
pub fn resolve_size(count: NodeCount, filtered_len: usize) -> usize {
    match count {
        NodeCount::Absolute(n) => n as usize,
        NodeCount::Percent(pct) => (filtered_len * pct as usize).div_ceil(100).max(1),
        NodeCount::All => filtered_len,
    }
}

/// Carves `filtered` (already filtered by state and group, in filter order)
/// into chunks per `spec`.
///
/// # Errors
///
/// Returns [`SchedEngineError::EmptyInventory`] if `filtered` is empty, or
/// [`SchedEngineError::EmptyChunk`] if the resolved chunk size is zero.
pub fn carve(filtered: &[&str], spec: &ChunkingSpec) -> Result<Vec<Chunk>, SchedEngineError> {
    if filtered.is_empty() {
        return Err(SchedEngineError::EmptyInventory);
    }

    let size = resolve_size(spec.size.unwrap_or(NodeCount::All), filtered.len());
    if size == 0 {
        return Err(SchedEngineError::EmptyChunk("0".to_string()));
    }

    let ordered = select_order(filtered, spec.node_selection);
    let whole_chunks = ordered.len() / size;
    let residual_count = ordered.len() % size;

    let mut chunks: Vec<Vec<String>> = ordered
        .chunks(size)
        .take(whole_chunks)
        .map(|group| group.to_vec())
        .collect();

    if residual_count > 0 {
        let residual: Vec<String> = ordered[whole_chunks * size..].to_vec();
        match spec.residual {
            ChunkResidual::Backfill => {
                if let Some(last) = chunks.last_mut() {
                    last.extend(residual);
                } else {
                    chunks.push(residual);
                }
            }
            ChunkResidual::Discard => {}
        }
    }

    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(index, nodes)| Chunk {
            id: ChunkId(u32::try_from(index).unwrap_or(u32::MAX)),
            nodes,
        })
        .collect())
}

/// Reorders `filtered` according to the selection discipline, without
/// changing which nodes are present.
fn select_order(filtered: &[&str], discipline: NodeSelection) -> Vec<String> {
    match discipline {
        NodeSelection::Contiguous => filtered.iter().map(|s| (*s).to_string()).collect(),
        NodeSelection::Distributed => distributed_order(filtered),
        NodeSelection::Random => {
            let mut nodes: Vec<String> = filtered.iter().map(|s| (*s).to_string()).collect();
            let mut rng = seeded_rng(filtered);
            shuffle(&mut nodes, &mut rng);
            nodes
        }
        NodeSelection::RandDist => {
            let mut buckets = distributed_order(filtered);
            let mut rng = seeded_rng(filtered);
            shuffle(&mut buckets, &mut rng);
            buckets
        }
    }
}

/// Every-r-th traversal: interleaves the filtered list across `stride`
/// buckets, where `stride` is the integer square root of the count (a
/// deterministic, size-adaptive spread with no configuration knob).
fn distributed_order(filtered: &[&str]) -> Vec<String> {
    let stride = (filtered.len() as f64).sqrt().ceil().max(1.0) as usize;
    let mut buckets: Vec<Vec<&str>> = vec![Vec::new(); stride];
    for (index, name) in filtered.iter().enumerate() {
        buckets[index % stride].push(name);
    }
    buckets.into_iter().flatten().map(ToString::to_string).collect()
}

/// Seeds a deterministic RNG from the filtered list's own content, so the
/// same filtered set always shuffles identically.
fn seeded_rng(filtered: &[&str]) -> StdRng {
    let mut hasher = Sha256::new();
    for name in filtered {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    StdRng::from_seed(seed)
}

fn shuffle<T>(items: &mut [T], rng: &mut StdRng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filtered(names: &[&str]) -> Vec<&str> {
        names.to_vec()
    }

    #[test]
    fn contiguous_chunks_assign_ids_in_filter_order() {
        let nodes = filtered(&["n1", "n2", "n3", "n4"]);
        let spec = ChunkingSpec {
            size: Some(NodeCount::Absolute(2)),
            node_selection: NodeSelection::Contiguous,
            ..ChunkingSpec::default()
        };
        let chunks = carve(&nodes, &spec).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, ChunkId(0));
        assert_eq!(chunks[0].nodes, vec!["n1", "n2"]);
        assert_eq!(chunks[1].nodes, vec!["n3", "n4"]);
    }

    #[test]
    fn backfill_merges_residual_into_last_chunk() {
        let nodes = filtered(&["n1", "n2", "n3", "n4", "n5"]);
        let spec = ChunkingSpec {
            size: Some(NodeCount::Absolute(2)),
            residual: ChunkResidual::Backfill,
            ..ChunkingSpec::default()
        };
        let chunks = carve(&nodes, &spec).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].nodes, vec!["n3", "n4", "n5"]);
    }

    #[test]
    fn discard_drops_residual_nodes() {
        let nodes = filtered(&["n1", "n2", "n3", "n4", "n5"]);
        let spec = ChunkingSpec {
            size: Some(NodeCount::Absolute(2)),
            residual: ChunkResidual::Discard,
            ..ChunkingSpec::default()
        };
        let chunks = carve(&nodes, &spec).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].nodes, vec!["n3", "n4"]);
    }

    #[test]
    fn same_inputs_produce_identical_random_chunks() {
        let nodes = filtered(&["n1", "n2", "n3", "n4", "n5", "n6"]);
        let spec = ChunkingSpec {
            size: Some(NodeCount::Absolute(3)),
            node_selection: NodeSelection::Random,
            ..ChunkingSpec::default()
        };
        let first = carve(&nodes, &spec).unwrap();
        let second = carve(&nodes, &spec).unwrap();
        assert_eq!(first[0].nodes, second[0].nodes);
        assert_eq!(first[1].nodes, second[1].nodes);
    }

    #[test]
    fn percent_size_rounds_up() {
        assert_eq!(resolve_size(NodeCount::Percent(50), 5), 3);
        assert_eq!(resolve_size(NodeCount::All, 7), 7);
    }

    #[test]
    fn empty_inventory_is_rejected() {
        let err = carve(&[], &ChunkingSpec::default()).unwrap_err();
        assert!(matches!(err, SchedEngineError::EmptyInventory));
    }
}
