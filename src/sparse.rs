//! Sparse trie: children kept in an ordered map keyed by any `Ord` type.
//!
//! Memory grows with the number of occupied children instead of a fixed
//! branching factor, and any key of type `K` is valid. Lookups accept
//! borrowed key forms the way [`BTreeMap::get`] does, so a
//! `SparseTrie<String, V>` can be queried with `&str` segments.

use std::borrow::Borrow;
use std::collections::{btree_map, BTreeMap};
use std::fmt;

use crate::path::{PathNode, PathTree};

/// A sparse trie node.
///
/// Like [`DenseNode`](crate::DenseNode), drops and clones its subtree
/// without recursion.
pub struct SparseNode<K, V> {
    value: V,
    children: BTreeMap<K, SparseNode<K, V>>,
}

impl<K, V: Default> SparseNode<K, V> {
    /// Creates an empty node with no children.
    pub fn new() -> Self {
        Self::with_value(V::default())
    }
}

impl<K, V: Default> Default for SparseNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SparseNode<K, V> {
    fn with_value(value: V) -> Self {
        Self {
            value,
            children: BTreeMap::new(),
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

    /// The child at `key`, looked up by any borrowed form of `K`.
    #[inline]
    pub fn child<Q>(&self, key: &Q) -> Option<&SparseNode<K, V>>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.children.get(key)
    }

    /// Number of children.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn retains_after_detach(&self) -> bool
    where
        V: Default + PartialEq,
    {
        self.children.len() > 1 || self.value != V::default()
    }
}

impl<K, V> Drop for SparseNode<K, V> {
    fn drop(&mut self) {
        let mut stack: Vec<SparseNode<K, V>> =
            std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

impl<K: Ord + Clone, V: Clone> Clone for SparseNode<K, V> {
    fn clone(&self) -> Self {
        type Frame<'a, K, V> = (
            Option<&'a K>,
            btree_map::Iter<'a, K, SparseNode<K, V>>,
            SparseNode<K, V>,
        );

        // Frames: key under the parent, unvisited children, copy so far.
        let mut stack: Vec<Frame<'_, K, V>> = Vec::new();
        let mut current: Frame<'_, K, V> =
            (None, self.children.iter(), Self::with_value(self.value.clone()));
        loop {
            let (key, mut children, copy) = current;
            match children.next() {
                Some((child_key, child)) => {
                    stack.push((key, children, copy));
                    current = (
                        Some(child_key),
                        child.children.iter(),
                        Self::with_value(child.value.clone()),
                    );
                }
                None => match (key, stack.pop()) {
                    (Some(key), Some((parent_key, siblings, mut parent))) => {
                        parent.children.insert(key.clone(), copy);
                        current = (parent_key, siblings, parent);
                    }
                    _ => return copy,
                },
            }
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for SparseNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseNode")
            .field("value", &self.value)
            .field("child_count", &self.children.len())
            .finish()
    }
}

/// A prefix tree whose nodes map arbitrary ordered keys to children.
///
/// ```rust
/// use path_trie::SparseTrie;
///
/// let mut trie: SparseTrie<&str, u32> = SparseTrie::new();
/// trie.add(["etc", "hosts"], 1);
/// trie.add(["etc", "passwd"], 2);
///
/// assert_eq!(trie.try_get_value(&["etc", "hosts"]), Some(&1));
/// assert_eq!(trie.remove(&["etc", "hosts"]), 1);
/// assert_eq!(trie.try_get_node(&["etc"]).map(|n| n.child_count()), Some(1));
/// ```
pub struct SparseTrie<K, V> {
    root: SparseNode<K, V>,
}

impl<K: Ord, V: Default> SparseTrie<K, V> {
    /// Creates a trie holding only a root with a default value.
    pub fn new() -> Self {
        Self {
            root: SparseNode::new(),
        }
    }

    /// Stores `value` at `path`, creating missing nodes, and returns the
    /// terminal node. An existing value is overwritten in place.
    ///
    /// An empty path stores into the root.
    pub fn add<I>(&mut self, path: I, value: V) -> &mut SparseNode<K, V>
    where
        I: IntoIterator<Item = K>,
    {
        let mut node = &mut self.root;
        for key in path {
            node = node.children.entry(key).or_insert_with(|| {
                trace!("sparse node created");
                SparseNode::new()
            });
        }
        node.value = value;
        node
    }

    /// Drops every node except the root and resets the root value.
    pub fn clear(&mut self) {
        self.root = SparseNode::new();
    }
}

impl<K: Ord, V> SparseTrie<K, V> {
    /// The root node, addressed by the empty path.
    #[inline]
    pub fn root(&self) -> &SparseNode<K, V> {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut SparseNode<K, V> {
        &mut self.root
    }

    /// The value at `path`, or `None` if no node exists there.
    ///
    /// A node that exists only as an intermediate step of a longer path
    /// reports `V::default()`.
    pub fn try_get_value<'a, Q, I>(&self, path: I) -> Option<&V>
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
    {
        self.try_get_node(path).map(SparseNode::value)
    }

    /// The node at `path`, or `None` if no node exists there.
    pub fn try_get_node<'a, Q, I>(&self, path: I) -> Option<&SparseNode<K, V>>
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
    {
        let mut node = &self.root;
        for key in path {
            node = node.children.get(key)?;
        }
        Some(node)
    }

    /// Mutable counterpart of [`try_get_node`](Self::try_get_node).
    pub fn try_get_node_mut<'a, Q, I>(&mut self, path: I) -> Option<&mut SparseNode<K, V>>
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
    {
        let mut node = &mut self.root;
        for key in path {
            node = node.children.get_mut(key)?;
        }
        Some(node)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        let mut stack = vec![&self.root];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.values());
        }
        count
    }
}

impl<K: Ord, V: Default + PartialEq> SparseTrie<K, V> {
    /// Detaches the node at `path` together with its subtree and returns its
    /// value.
    ///
    /// Ancestors left with no children and a default value are pruned, from
    /// the deepest upward, stopping at the first one that still holds a
    /// child or a non-default value. The root is never pruned.
    ///
    /// Returns `V::default()` without modifying the trie when `path` is
    /// empty or no node exists at `path`.
    pub fn remove<'a, Q, I>(&mut self, path: I) -> V
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
    {
        let path: Vec<&'a Q> = path.into_iter().collect();
        if path.is_empty() {
            return V::default();
        }

        let mut cut = 0;
        let mut node = &self.root;
        for (depth, key) in path.iter().enumerate() {
            if node.retains_after_detach() {
                cut = depth;
            }
            match node.children.get(*key) {
                Some(child) => node = child,
                None => return V::default(),
            }
        }

        let Some(parent) = self.try_get_node_mut(path[..cut].iter().copied()) else {
            return V::default();
        };
        let Some(mut detached) = parent.children.remove(path[cut]) else {
            return V::default();
        };
        trace!(depth = path.len(), cut, "sparse subtree detached");

        for key in &path[cut + 1..] {
            match detached.children.remove(*key) {
                Some(next) => detached = next,
                None => return V::default(),
            }
        }
        std::mem::take(&mut detached.value)
    }
}

impl<K: Ord, V: Default> Default for SparseTrie<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for SparseTrie<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K: Ord, V: fmt::Debug> fmt::Debug for SparseTrie<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseTrie")
            .field("nodes", &self.node_count())
            .field("root", &self.root)
            .finish()
    }
}

impl<K, V> PathNode for SparseNode<K, V> {
    type Value = V;

    fn value(&self) -> &V {
        SparseNode::value(self)
    }

    fn child_count(&self) -> usize {
        SparseNode::child_count(self)
    }
}

impl<K: Ord + Clone, V: Default + PartialEq> PathTree<K> for SparseTrie<K, V> {
    type Value = V;
    type Node = SparseNode<K, V>;

    fn add(&mut self, path: &[K], value: V) -> &mut SparseNode<K, V> {
        SparseTrie::add(self, path.iter().cloned(), value)
    }

    fn try_get_value(&self, path: &[K]) -> Option<&V> {
        SparseTrie::try_get_value(self, path)
    }

    fn try_get_node(&self, path: &[K]) -> Option<&SparseNode<K, V>> {
        SparseTrie::try_get_node(self, path)
    }

    fn remove(&mut self, path: &[K]) -> V {
        SparseTrie::remove(self, path)
    }

    fn root(&self) -> &SparseNode<K, V> {
        SparseTrie::root(self)
    }

    fn node_count(&self) -> usize {
        SparseTrie::node_count(self)
    }
}
