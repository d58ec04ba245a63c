//! Shape contract shared by the dense and sparse tries.
//!
//! Both tries expose richer inherent APIs (borrowed sparse lookups, checked
//! dense insertion). The traits here fix the common subset over slice paths
//! so code can be written once against either layout.

/// A node reachable from a [`PathTree`] root.
pub trait PathNode {
    /// Payload stored at the node.
    type Value;

    /// The node's value, `Default::default()` if nothing was stored.
    fn value(&self) -> &Self::Value;

    /// Number of direct children.
    fn child_count(&self) -> usize;

    /// Whether the node has no children.
    fn is_leaf(&self) -> bool {
        self.child_count() == 0
    }
}

/// A tree mapping key paths of `K` to values.
///
/// The root always exists and corresponds to the empty path.
pub trait PathTree<K> {
    /// Payload stored at each node.
    type Value;
    /// Node type handed back by lookups.
    type Node: PathNode<Value = Self::Value>;

    /// Stores `value` at `path`, creating missing nodes, and returns the
    /// terminal node. Overwrites any previous value.
    fn add(&mut self, path: &[K], value: Self::Value) -> &mut Self::Node;

    /// The value at `path`, or `None` if no node exists there.
    fn try_get_value(&self, path: &[K]) -> Option<&Self::Value>;

    /// The node at `path`, or `None` if no node exists there.
    fn try_get_node(&self, path: &[K]) -> Option<&Self::Node>;

    /// Detaches the node at `path` with its subtree, prunes ancestors left
    /// childless with a default value, and returns the detached value.
    ///
    /// Returns the default value, without touching the tree, when `path` is
    /// empty or absent.
    fn remove(&mut self, path: &[K]) -> Self::Value;

    /// The root node.
    fn root(&self) -> &Self::Node;

    /// Number of live nodes, root included.
    fn node_count(&self) -> usize;
}
