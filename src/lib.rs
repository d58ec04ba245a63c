//! # path-trie
//!
//! Path-indexed prefix trees. A path is a sequence of keys, one key per
//! level, and every prefix of a stored path owns its own node.
//!
//! Two layouts are provided:
//!
//! - [`DenseTrie`]: every node preallocates a slot array of the trie's
//!   branching factor (default [`DEFAULT_NODE_SIZE`]) and children are found
//!   by indexing it with the key. Constant-time steps, memory proportional to
//!   the branching factor regardless of occupancy.
//! - [`SparseTrie`]: children live in an ordered map keyed by any `Ord` type.
//!   Memory proportional to occupancy, logarithmic steps.
//!
//! Both overwrite on [`add`](DenseTrie::add), fail softly on lookups of
//! absent paths, and prune ancestors left empty by
//! [`remove`](DenseTrie::remove).
//!
//! ## Stored defaults
//!
//! Nodes carry no presence flag: a node's value is either what was last
//! stored or `V::default()`. Storing a default value is indistinguishable
//! from never storing one, both for lookups of intermediate nodes and for the
//! pruning decision in `remove`. Wrap values in `Option` when that difference
//! matters.
//!
//! ## Example
//!
//! ```rust
//! use path_trie::{DenseTrie, SparseTrie};
//!
//! let mut dense: DenseTrie<u64> = DenseTrie::with_node_size(16);
//! dense.add(&[1u8, 2, 3], 7);
//! assert_eq!(dense.try_get_value(&[1u8, 2, 3]), Some(&7));
//! assert_eq!(dense.remove(&[1u8, 2, 3]), 7);
//! assert_eq!(dense.try_get_value(&[1u8, 2, 3]), None);
//!
//! let mut sparse: SparseTrie<String, u64> = SparseTrie::new();
//! sparse.add(["usr".to_string(), "bin".to_string()], 1);
//! assert_eq!(sparse.try_get_value(["usr", "bin"]), Some(&1));
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

/// Emits a `tracing` event at trace level when the `tracing` feature is on.
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)*);
    };
}

pub mod dense;
#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod error;
pub mod path;
pub mod sparse;

pub use dense::{DenseKey, DenseNode, DenseTrie, DEFAULT_NODE_SIZE};
pub use error::DenseTrieError;
pub use path::{PathNode, PathTree};
pub use sparse::{SparseNode, SparseTrie};

#[cfg(test)]
mod proptests;
