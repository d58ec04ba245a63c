//! Errors reported by the checked dense-trie entry points.

use thiserror::Error;

/// Misuse of a [`DenseTrie`](crate::DenseTrie) key domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenseTrieError {
    /// A path segment does not fit the trie's branching factor.
    #[error("key {key} at depth {depth} is out of range for node size {node_size}")]
    KeyOutOfRange {
        /// Slot index the key mapped to.
        key: usize,
        /// Position of the key within the path.
        depth: usize,
        /// Branching factor the trie was built with.
        node_size: usize,
    },
}
