//! Node footprint measurement and capacity projections for [`DenseTrie`].
//!
//! Dense nodes cost the same regardless of occupancy, so the memory of a
//! fully populated trie follows directly from the branching factor and the
//! per-node size. This module measures that size with a [`MemoryProbe`] and
//! projects it over tree levels:
//!
//! ```text
//! nodes on level L (1-based)  = node_size ^ (L - 1)
//! bytes on level L            = nodes on level L * node bytes
//! tree totals                 = sums over levels 1..=L
//! ```
//!
//! Measurements isolate the allocation delta of building one node, so they
//! must run on a single thread with no other allocation activity in flight.
//!
//! [`DenseTrie`]: crate::DenseTrie

use std::mem::size_of;

use thiserror::Error;
use tikv_jemalloc_ctl::{epoch, stats};

use crate::dense::DenseNode;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("jemalloc statistics unavailable: {0}")]
    Jemalloc(#[from] tikv_jemalloc_ctl::Error),
}

/// Source of the process's currently allocated byte count.
pub trait MemoryProbe {
    fn allocated(&mut self) -> Result<usize, ProbeError>;
}

/// Reads jemalloc's `stats.allocated`.
///
/// Only meaningful when the binary installs `tikv_jemallocator::Jemalloc` as
/// its global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct JemallocProbe;

impl MemoryProbe for JemallocProbe {
    fn allocated(&mut self) -> Result<usize, ProbeError> {
        epoch::advance()?;
        Ok(stats::allocated::read()?)
    }
}

/// Heap bytes one boxed dense node occupies, per the type layout.
pub fn estimated_node_size<V>(node_size: usize) -> usize {
    size_of::<DenseNode<V>>() + node_size * size_of::<Option<Box<DenseNode<V>>>>()
}

/// Measures the allocation delta of building one boxed dense node with
/// `node_size` slots, the way the trie stores non-root nodes.
pub fn measure_node_size<V: Default, P: MemoryProbe>(
    probe: &mut P,
    node_size: usize,
) -> Result<usize, ProbeError> {
    let before = probe.allocated()?;
    let node = std::hint::black_box(Box::new(DenseNode::<V>::new(node_size)));
    let after = probe.allocated()?;
    drop(node);

    let delta = after.saturating_sub(before);
    #[cfg(feature = "tracing")]
    tracing::debug!(
        node_size,
        delta,
        estimated = estimated_node_size::<V>(node_size),
        "measured dense node"
    );
    Ok(delta)
}

/// Maximum node count on `level` (1-based; the root is level 1).
pub fn level_nodes_max(level: u32, node_size: usize) -> u128 {
    match level {
        0 => 0,
        _ => (node_size as u128).saturating_pow(level - 1),
    }
}

/// Maximum node count of a tree with `levels` levels.
pub fn tree_nodes_max(levels: u32, node_size: usize) -> u128 {
    (1..=levels).fold(0u128, |acc, level| {
        acc.saturating_add(level_nodes_max(level, node_size))
    })
}

/// Maximum byte size of `level` given the bytes of one node.
pub fn level_max_size(level: u32, node_size: usize, node_bytes: usize) -> u128 {
    level_nodes_max(level, node_size).saturating_mul(node_bytes as u128)
}

/// Maximum byte size of a tree with `levels` levels.
pub fn tree_max_size(levels: u32, node_size: usize, node_bytes: usize) -> u128 {
    (1..=levels).fold(0u128, |acc, level| {
        acc.saturating_add(level_max_size(level, node_size, node_bytes))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFootprint {
    pub level: u32,
    /// Nodes on this level when fully populated.
    pub nodes: u128,
    /// Bytes of those nodes.
    pub bytes: u128,
    /// Paths of length `level` the level's nodes can address.
    pub items: u128,
}

/// Capacity plan for a fully populated dense trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFootprint {
    pub node_size: usize,
    pub node_bytes: usize,
    pub levels: Vec<LevelFootprint>,
    pub total_nodes: u128,
    pub total_bytes: u128,
}

impl TreeFootprint {
    /// Projects `levels` levels from an already known per-node size.
    pub fn project(level_count: u32, node_size: usize, node_bytes: usize) -> Self {
        let levels: Vec<LevelFootprint> = (1..=level_count)
            .map(|level| LevelFootprint {
                level,
                nodes: level_nodes_max(level, node_size),
                bytes: level_max_size(level, node_size, node_bytes),
                items: (node_size as u128).saturating_pow(level),
            })
            .collect();
        let total_nodes = levels
            .iter()
            .fold(0u128, |acc, l| acc.saturating_add(l.nodes));
        let total_bytes = levels
            .iter()
            .fold(0u128, |acc, l| acc.saturating_add(l.bytes));
        Self {
            node_size,
            node_bytes,
            levels,
            total_nodes,
            total_bytes,
        }
    }

    /// Projects `levels` levels using the layout-derived node size for `V`.
    pub fn estimate<V>(levels: u32, node_size: usize) -> Self {
        Self::project(levels, node_size, estimated_node_size::<V>(node_size))
    }

    /// Projects `levels` levels using a node size measured with `probe`.
    pub fn measure<V: Default, P: MemoryProbe>(
        probe: &mut P,
        levels: u32,
        node_size: usize,
    ) -> Result<Self, ProbeError> {
        let node_bytes = measure_node_size::<V, P>(probe, node_size)?;
        Ok(Self::project(levels, node_size, node_bytes))
    }
}
