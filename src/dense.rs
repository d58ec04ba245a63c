//! Dense trie: fixed branching factor, children indexed directly by key.
//!
//! Every node owns a slot array of exactly `node_size` entries, allocated
//! once when the node is created. A key is the slot index, so it must lie in
//! `0..node_size`; anything else is caller misuse and panics.
//!
//! Memory per node is `node_size` pointers plus the value, independent of
//! how many slots are occupied. See
//! [`diagnostics`](crate::diagnostics) (feature `diagnostics`) for measured
//! and projected footprints.

use std::fmt;

use crate::error::DenseTrieError;
use crate::path::{PathNode, PathTree};

/// Branching factor used by [`DenseTrie::new`].
pub const DEFAULT_NODE_SIZE: usize = 256;

/// Key types usable as dense trie path segments.
pub trait DenseKey: Copy {
    /// Slot index addressed by this key.
    fn slot(self) -> usize;
}

macro_rules! impl_dense_key {
    ($($ty:ty),*) => {
        $(
            impl DenseKey for $ty {
                #[inline]
                fn slot(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_dense_key!(u8, u16, u32, usize);

/// A dense trie node.
///
/// Dropping and cloning walk the subtree with an explicit stack, so path
/// length is bounded by memory rather than by the thread's stack.
pub struct DenseNode<V> {
    value: V,
    children: Box<[Option<Box<DenseNode<V>>>]>,
    /// Occupied slots in `children`.
    count: usize,
}

impl<V: Default> DenseNode<V> {
    /// Creates an empty node with `node_size` vacant slots.
    pub fn new(node_size: usize) -> Self {
        Self::with_value(V::default(), node_size)
    }
}

impl<V> DenseNode<V> {
    fn with_value(value: V, node_size: usize) -> Self {
        let mut children = Vec::with_capacity(node_size);
        children.resize_with(node_size, || None);
        Self {
            value,
            children: children.into_boxed_slice(),
            count: 0,
        }
    }

    /// The stored value, `V::default()` if nothing was stored.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Mutable access to the stored value.
    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The child at `key`.
    ///
    /// # Panics
    ///
    /// If `key` is not below [`capacity`](Self::capacity).
    #[inline]
    pub fn child<K: DenseKey>(&self, key: K) -> Option<&DenseNode<V>> {
        self.children[key.slot()].as_deref()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.count
    }

    /// Number of slots, i.e. the owning trie's node size.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.children.len()
    }

    /// Whether no slot is occupied.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.count == 0
    }

    /// Whether this node stays alive once one of its children is detached.
    fn retains_after_detach(&self) -> bool
    where
        V: Default + PartialEq,
    {
        self.count > 1 || self.value != V::default()
    }
}

impl<V> Drop for DenseNode<V> {
    fn drop(&mut self) {
        let mut stack: Vec<Box<DenseNode<V>>> =
            self.children.iter_mut().filter_map(Option::take).collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.children.iter_mut().filter_map(Option::take));
        }
    }
}

impl<V: Clone> Clone for DenseNode<V> {
    fn clone(&self) -> Self {
        // Frames: source node, next slot to visit, copy built so far. A copy
        // is attached to its parent once all of its own children are.
        let mut stack: Vec<(&DenseNode<V>, usize, DenseNode<V>)> = Vec::new();
        let mut current = (self, 0, self.vacant_copy());
        loop {
            let (src, next, copy) = current;
            let occupied = src
                .children
                .iter()
                .enumerate()
                .skip(next)
                .find_map(|(slot, child)| Some((slot, child.as_deref()?)));
            match occupied {
                Some((slot, child)) => {
                    stack.push((src, slot + 1, copy));
                    current = (child, 0, child.vacant_copy());
                }
                None => match stack.pop() {
                    Some((parent, next, mut parent_copy)) => {
                        parent_copy.children[next - 1] = Some(Box::new(copy));
                        parent_copy.count += 1;
                        current = (parent, next, parent_copy);
                    }
                    None => return copy,
                },
            }
        }
    }
}

impl<V: Clone> DenseNode<V> {
    /// Copy of the value with every slot vacant.
    fn vacant_copy(&self) -> Self {
        Self::with_value(self.value.clone(), self.children.len())
    }
}

impl<V: fmt::Debug> fmt::Debug for DenseNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseNode")
            .field("value", &self.value)
            .field("capacity", &self.children.len())
            .field("child_count", &self.count)
            .finish()
    }
}

/// A prefix tree whose nodes index children by small integer keys.
///
/// ```rust
/// use path_trie::DenseTrie;
///
/// let mut trie: DenseTrie<&str> = DenseTrie::with_node_size(16);
/// trie.add(&[1u8, 2, 3], "a");
/// trie.add(&[1u8, 2, 4], "b");
///
/// assert_eq!(trie.remove(&[1u8, 2, 3]), "a");
/// // [1, 2] still leads to [1, 2, 4].
/// assert!(trie.try_get_node(&[1u8, 2]).is_some());
///
/// trie.remove(&[1u8, 2, 4]);
/// assert!(trie.try_get_node(&[1u8]).is_none());
/// ```
#[derive(Clone)]
pub struct DenseTrie<V> {
    node_size: usize,
    root: DenseNode<V>,
}

impl<V: Default> DenseTrie<V> {
    /// Creates a trie with [`DEFAULT_NODE_SIZE`] slots per node.
    pub fn new() -> Self {
        Self::with_node_size(DEFAULT_NODE_SIZE)
    }

    /// Creates a trie with `node_size` slots per node.
    ///
    /// # Panics
    ///
    /// If `node_size` is zero.
    pub fn with_node_size(node_size: usize) -> Self {
        assert!(node_size > 0, "node size must be non-zero");
        Self {
            node_size,
            root: DenseNode::new(node_size),
        }
    }

    /// Stores `value` at `path`, creating missing nodes, and returns the
    /// terminal node. An existing value is overwritten in place.
    ///
    /// An empty path stores into the root.
    ///
    /// # Panics
    ///
    /// If any key is out of range for the node size. The trie is left
    /// unchanged.
    #[track_caller]
    pub fn add<K: DenseKey>(&mut self, path: &[K], value: V) -> &mut DenseNode<V> {
        match self.try_add(path, value) {
            Ok(node) => node,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`add`](Self::add), but reports out-of-range keys instead of
    /// panicking.
    pub fn try_add<K: DenseKey>(
        &mut self,
        path: &[K],
        value: V,
    ) -> Result<&mut DenseNode<V>, DenseTrieError> {
        self.validate_path(path)?;
        let node_size = self.node_size;
        let mut node = &mut self.root;
        for key in path {
            let slot = key.slot();
            if node.children[slot].is_none() {
                node.count += 1;
                trace!(slot, "dense node created");
            }
            node = &mut **node.children[slot]
                .get_or_insert_with(|| Box::new(DenseNode::new(node_size)));
        }
        node.value = value;
        Ok(node)
    }

    /// Drops every node except the root and resets the root value.
    pub fn clear(&mut self) {
        self.root = DenseNode::new(self.node_size);
    }
}

impl<V> DenseTrie<V> {
    /// Slots per node.
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// The root node, addressed by the empty path.
    #[inline]
    pub fn root(&self) -> &DenseNode<V> {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut DenseNode<V> {
        &mut self.root
    }

    /// Checks every key of `path` against the node size.
    pub fn validate_path<K: DenseKey>(&self, path: &[K]) -> Result<(), DenseTrieError> {
        match path.iter().position(|key| key.slot() >= self.node_size) {
            Some(depth) => Err(DenseTrieError::KeyOutOfRange {
                key: path[depth].slot(),
                depth,
                node_size: self.node_size,
            }),
            None => Ok(()),
        }
    }

    #[track_caller]
    fn check<K: DenseKey>(&self, path: &[K]) {
        if let Err(err) = self.validate_path(path) {
            panic!("{err}");
        }
    }

    /// The value at `path`, or `None` if no node exists there.
    ///
    /// A node that exists only as an intermediate step of a longer path
    /// reports `V::default()`.
    ///
    /// # Panics
    ///
    /// If any key is out of range for the node size.
    #[track_caller]
    pub fn try_get_value<K: DenseKey>(&self, path: &[K]) -> Option<&V> {
        self.try_get_node(path).map(DenseNode::value)
    }

    /// The node at `path`, or `None` if no node exists there.
    ///
    /// # Panics
    ///
    /// If any key is out of range for the node size.
    #[track_caller]
    pub fn try_get_node<K: DenseKey>(&self, path: &[K]) -> Option<&DenseNode<V>> {
        self.check(path);
        let mut node = &self.root;
        for key in path {
            node = node.children[key.slot()].as_deref()?;
        }
        Some(node)
    }

    /// Mutable counterpart of [`try_get_node`](Self::try_get_node).
    #[track_caller]
    pub fn try_get_node_mut<K: DenseKey>(&mut self, path: &[K]) -> Option<&mut DenseNode<V>> {
        self.check(path);
        self.descend_mut(path)
    }

    fn descend_mut<K: DenseKey>(&mut self, path: &[K]) -> Option<&mut DenseNode<V>> {
        let mut node = &mut self.root;
        for key in path {
            node = node.children[key.slot()].as_deref_mut()?;
        }
        Some(node)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        let mut stack = vec![&self.root];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter().flatten().map(|child| &**child));
        }
        count
    }
}

impl<V: Default + PartialEq> DenseTrie<V> {
    /// Detaches the node at `path` together with its subtree and returns its
    /// value.
    ///
    /// Ancestors left with no children and a default value are pruned, from
    /// the deepest upward, stopping at the first one that still holds a
    /// child or a non-default value. The root is never pruned.
    ///
    /// Returns `V::default()` without modifying the trie when `path` is
    /// empty or no node exists at `path`.
    ///
    /// # Panics
    ///
    /// If any key is out of range for the node size.
    #[track_caller]
    pub fn remove<K: DenseKey>(&mut self, path: &[K]) -> V {
        self.check(path);
        if path.is_empty() {
            return V::default();
        }

        // Deepest ancestor that survives the prune; detaching happens below it.
        let mut cut = 0;
        let mut node = &self.root;
        for (depth, key) in path.iter().enumerate() {
            if node.retains_after_detach() {
                cut = depth;
            }
            match node.children[key.slot()].as_deref() {
                Some(child) => node = child,
                None => return V::default(),
            }
        }

        let Some(parent) = self.descend_mut(&path[..cut]) else {
            return V::default();
        };
        let Some(mut detached) = parent.children[path[cut].slot()].take() else {
            return V::default();
        };
        parent.count -= 1;
        trace!(depth = path.len(), cut, "dense subtree detached");

        for key in &path[cut + 1..] {
            match detached.children[key.slot()].take() {
                Some(next) => detached = next,
                None => return V::default(),
            }
        }
        std::mem::take(&mut detached.value)
    }
}

impl<V: Default> Default for DenseTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for DenseTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseTrie")
            .field("node_size", &self.node_size)
            .field("nodes", &self.node_count())
            .field("root", &self.root)
            .finish()
    }
}

impl<V> PathNode for DenseNode<V> {
    type Value = V;

    fn value(&self) -> &V {
        DenseNode::value(self)
    }

    fn child_count(&self) -> usize {
        DenseNode::child_count(self)
    }
}

impl<K: DenseKey, V: Default + PartialEq> PathTree<K> for DenseTrie<V> {
    type Value = V;
    type Node = DenseNode<V>;

    fn add(&mut self, path: &[K], value: V) -> &mut DenseNode<V> {
        DenseTrie::add(self, path, value)
    }

    fn try_get_value(&self, path: &[K]) -> Option<&V> {
        DenseTrie::try_get_value(self, path)
    }

    fn try_get_node(&self, path: &[K]) -> Option<&DenseNode<V>> {
        DenseTrie::try_get_node(self, path)
    }

    fn remove(&mut self, path: &[K]) -> V {
        DenseTrie::remove(self, path)
    }

    fn root(&self) -> &DenseNode<V> {
        DenseTrie::root(self)
    }

    fn node_count(&self) -> usize {
        DenseTrie::node_count(self)
    }
}
