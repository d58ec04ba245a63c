use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, BTreeSet};

/// Small key and value domains so paths collide and defaults show up often.
const KEYS: u8 = 4;

fn path_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0..KEYS, 0..=4)
}

fn value_strategy() -> impl Strategy<Value = u8> {
    prop_oneof![1 => Just(0u8), 3 => 1u8..=255]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Add(
        #[proptest(strategy = "path_strategy()")] Vec<u8>,
        #[proptest(strategy = "value_strategy()")] u8,
    ),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "path_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "path_strategy()")] Vec<u8>),
}

/// Reference model: the stored values keyed by full path.
///
/// A node exists exactly for the prefixes of stored paths, plus the root.
#[derive(Default)]
struct Model {
    values: BTreeMap<Vec<u8>, u8>,
}

impl Model {
    fn exists(&self, path: &[u8]) -> bool {
        path.is_empty() || self.values.keys().any(|k| k.starts_with(path))
    }

    fn add(&mut self, path: &[u8], value: u8) {
        self.values.insert(path.to_vec(), value);
    }

    fn get(&self, path: &[u8]) -> Option<u8> {
        self.exists(path)
            .then(|| self.values.get(path).copied().unwrap_or_default())
    }

    fn remove(&mut self, path: &[u8]) -> u8 {
        if path.is_empty() || !self.exists(path) {
            return 0;
        }
        let removed = self.values.get(path).copied().unwrap_or_default();
        self.values.retain(|k, _| !k.starts_with(path));

        for depth in (1..path.len()).rev() {
            let ancestor = &path[..depth];
            let has_children = self
                .values
                .keys()
                .any(|k| k.len() > depth && k.starts_with(ancestor));
            let value = self.values.get(ancestor).copied().unwrap_or_default();
            if has_children || value != 0 {
                break;
            }
            self.values.remove(ancestor);
        }
        removed
    }

    fn node_count(&self) -> usize {
        let mut prefixes: BTreeSet<&[u8]> = BTreeSet::new();
        prefixes.insert(&[]);
        for key in self.values.keys() {
            for len in 1..=key.len() {
                prefixes.insert(&key[..len]);
            }
        }
        prefixes.len()
    }
}

fn run_against_model<T>(mut tree: T, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    T: PathTree<u8, Value = u8>,
{
    let mut model = Model::default();

    for op in ops {
        match op {
            Op::Add(path, value) => {
                let node = tree.add(&path, value);
                prop_assert_eq!(*node.value(), value);
                model.add(&path, value);
            }
            Op::Remove(path) => {
                let got = tree.remove(&path);
                let expected = model.remove(&path);
                prop_assert_eq!(got, expected);
                if !path.is_empty() {
                    prop_assert_eq!(tree.try_get_value(&path), None);
                }
            }
            Op::Get(path) => {
                prop_assert_eq!(tree.try_get_value(&path).copied(), model.get(&path));
                prop_assert_eq!(tree.try_get_node(&path).is_some(), model.exists(&path));
            }
        }

        prop_assert_eq!(tree.node_count(), model.node_count());
    }

    for (path, value) in &model.values {
        prop_assert_eq!(tree.try_get_value(path), Some(value));
    }
    Ok(())
}

fn validate_dense<V>(t: &DenseTrie<V>) {
    let mut stack = vec![t.root()];
    while let Some(node) = stack.pop() {
        let children: Vec<&DenseNode<V>> = (0..node.capacity())
            .filter_map(|slot| node.child(slot))
            .collect();
        assert_eq!(
            node.child_count(),
            children.len(),
            "child counter must match occupied slots"
        );
        stack.extend(children);
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_dense_matches_model(ops in prop::collection::vec(any::<Op>(), 0..=300)) {
        run_against_model(DenseTrie::<u8>::with_node_size(KEYS as usize), ops)?;
    }

    #[test]
    fn prop_sparse_matches_model(ops in prop::collection::vec(any::<Op>(), 0..=300)) {
        run_against_model(SparseTrie::<u8, u8>::new(), ops)?;
    }

    #[test]
    fn prop_dense_counters_stay_in_sync(ops in prop::collection::vec(any::<Op>(), 0..=300)) {
        let mut t = DenseTrie::<u8>::with_node_size(KEYS as usize);
        for op in ops {
            match op {
                Op::Add(path, value) => {
                    t.add(&path, value);
                }
                Op::Remove(path) => {
                    t.remove(&path);
                }
                Op::Get(_) => {}
            }
            validate_dense(&t);
        }
    }

    #[test]
    fn prop_dense_and_sparse_agree(ops in prop::collection::vec(any::<Op>(), 0..=300)) {
        let mut dense = DenseTrie::<u8>::with_node_size(KEYS as usize);
        let mut sparse = SparseTrie::<u8, u8>::new();
        for op in ops {
            match op {
                Op::Add(path, value) => {
                    dense.add(&path, value);
                    sparse.add(path.iter().copied(), value);
                }
                Op::Remove(path) => {
                    prop_assert_eq!(dense.remove(&path), sparse.remove(&path));
                }
                Op::Get(path) => {
                    prop_assert_eq!(dense.try_get_value(&path), sparse.try_get_value(&path));
                }
            }
        }
        prop_assert_eq!(dense.node_count(), sparse.node_count());
    }

    #[test]
    fn prop_out_of_range_key_rejected(
        path in prop::collection::vec(0u8..=255, 1..=6),
        node_size in 1usize..=64,
    ) {
        let mut t = DenseTrie::<u8>::with_node_size(node_size);
        let bad = path.iter().position(|&k| usize::from(k) >= node_size);
        let added = t.try_add(&path, 1).map(|_| ());
        match (added, bad) {
            (Ok(()), None) => {
                prop_assert_eq!(t.try_get_value(&path), Some(&1));
            }
            (Err(DenseTrieError::KeyOutOfRange { key, depth, node_size: n }), Some(at)) => {
                prop_assert_eq!(depth, at);
                prop_assert_eq!(key, usize::from(path[at]));
                prop_assert_eq!(n, node_size);
                prop_assert_eq!(t.node_count(), 1);
            }
            (got, expected) => {
                return Err(TestCaseError::fail(format!(
                    "try_add returned {:?} for first bad key at {:?}",
                    got, expected
                )));
            }
        }
    }
}

#[test]
fn exhaustive_removal_order_small_set() {
    let paths: Vec<Vec<u8>> = vec![
        vec![1],
        vec![1, 2],
        vec![1, 2, 3],
        vec![1, 2, 0],
        vec![0, 3],
        vec![3],
    ];

    let mut base = DenseTrie::<u8>::with_node_size(KEYS as usize);
    for (i, path) in paths.iter().enumerate() {
        base.add(path, i as u8 + 1);
    }

    each_ordering(&paths, |perm| {
        let mut t = base.clone();
        let mut m = Model::default();
        for (i, path) in paths.iter().enumerate() {
            m.add(path, i as u8 + 1);
        }
        for path in perm {
            assert_eq!(t.remove(&path), m.remove(&path));
            assert_eq!(t.node_count(), m.node_count());
            validate_dense(&t);
        }
        assert_eq!(t.node_count(), 1);
    });
}

/// Calls `f` with `items` in every order, stepping through index
/// permutations lexicographically.
fn each_ordering<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    let mut order: Vec<usize> = (0..items.len()).collect();
    loop {
        f(order.iter().map(|&i| items[i].clone()).collect());
        let Some(pivot) = order.windows(2).rposition(|w| w[0] < w[1]) else {
            return;
        };
        let swap = order
            .iter()
            .rposition(|&i| i > order[pivot])
            .expect("an ascent has a larger successor");
        order.swap(pivot, swap);
        order[pivot + 1..].reverse();
    }
}
