//! B+tree with a forward-linked leaf chain.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use alloc::string::String;
use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::config::checked_min_degree;
use crate::error::ConfigError;
use crate::index::OrderedIndex;
use crate::raw::{Arena, DEFAULT_MIN_DEGREE, Handle, InternalNode, Node, SearchResult, max_keys, min_keys};

/// An ordered index kept as a B+tree of minimum degree `t`.
///
/// Entries live only in the leaves; internal nodes hold copies of keys used purely for
/// navigation. Every non-root node holds between `t - 1` and `2t - 1` keys and all leaves
/// sit at the same depth. The leaves form a singly linked chain in ascending key order, so
/// a range scan descends once and then walks the chain.
///
/// Insertion splits full nodes on the way down; removal repairs underfull nodes on the way
/// back up by borrowing from a sibling or merging with one.
///
/// # Examples
///
/// ```
/// use ordered_index::{BPlusTree, OrderedIndex};
///
/// let mut tree = BPlusTree::new();
/// for key in [50, 30, 70, 20, 40, 60, 80] {
///     tree.insert(key, ());
/// }
/// assert!(tree.contains_key(&40));
/// assert!(!tree.contains_key(&90));
/// ```
#[derive(Clone)]
pub struct BPlusTree<K, V> {
    nodes: Arena<Node<K, V>>,
    root: Option<Handle>,
    // Head of the leaf chain.
    first_leaf: Option<Handle>,
    len: usize,
    min_degree: usize,
}

/// Path element for tracking traversal during removal.
struct PathElement {
    node: Handle,
    child_index: usize,
}

type Path = SmallVec<[PathElement; 16]>;

/// A position inside a leaf. Positions are kept normalized: the index is always within the
/// leaf, and the position one past a leaf's last entry is the next leaf's first.
type Position = Option<(Handle, usize)>;

/// Ascending iterator over a key range of a [`BPlusTree`], walking the leaf chain.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    front: Position,
    // Exclusive.
    end: Position,
}

impl<K, V> BPlusTree<K, V> {
    /// Creates an empty tree of minimum degree 3.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            first_leaf: None,
            len: 0,
            min_degree: DEFAULT_MIN_DEGREE,
        }
    }

    /// Creates an empty tree of minimum degree `min_degree`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MinDegreeTooSmall`] if `min_degree < 2`.
    pub fn with_min_degree(min_degree: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            min_degree: checked_min_degree(min_degree)?,
            ..Self::new()
        })
    }

    /// The minimum degree `t`.
    #[must_use]
    pub fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Number of levels, counting the leaves; 0 when empty.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = match self.nodes.get(handle) {
                Node::Internal(internal) => Some(internal.child(0)),
                Node::Leaf(_) => None,
            };
        }
        height
    }

    fn normalize(&self, leaf: Handle, index: usize) -> Position {
        let node = self.nodes.get(leaf).as_leaf();
        if index < node.key_count() {
            Some((leaf, index))
        } else {
            node.next().map(|next| (next, 0))
        }
    }

    /// Every entry, walking the leaf chain from its head.
    fn chain(&self) -> Range<'_, K, V> {
        Range {
            nodes: &self.nodes,
            front: self.first_leaf.and_then(|leaf| self.normalize(leaf, 0)),
            end: None,
        }
    }

    /// Splits the full child `handle`, returning the separator and the new right sibling.
    fn split_child(&mut self, handle: Handle) -> (K, Handle)
    where
        K: Clone,
    {
        let min_degree = self.min_degree;
        match self.nodes.get_mut(handle) {
            Node::Leaf(leaf) => {
                let (separator, right) = leaf.split(min_degree);
                let right = self.nodes.insert(Node::Leaf(right));
                // Splice the new leaf in directly after the one it came from.
                self.nodes.get_mut(handle).as_leaf_mut().set_next(Some(right));
                tracing::trace!(left = ?handle, ?right, "split leaf");
                (separator, right)
            }
            Node::Internal(internal) => {
                let (median, right) = internal.split(min_degree);
                let right = self.nodes.insert(Node::Internal(right));
                tracing::trace!(left = ?handle, ?right, "split internal node");
                (median, right)
            }
        }
    }

    fn leaf_for<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(internal.search_child(key));
        }
        Some(current)
    }

    /// Restores the key-count bound of `node` and of any ancestor that underflows in turn.
    fn rebalance(&mut self, mut node: Handle, path: &mut Path)
    where
        K: Clone,
    {
        let min_degree = self.min_degree;
        while let Some(PathElement {
            node: parent,
            child_index,
        }) = path.pop()
        {
            let internal = self.nodes.get(parent).as_internal();
            let left = (child_index > 0).then(|| internal.child(child_index - 1));
            let right = (child_index + 1 < internal.child_count()).then(|| internal.child(child_index + 1));

            if let Some(left) = left.filter(|&l| self.nodes.get(l).can_lend(min_degree)) {
                self.borrow_from_left(parent, child_index, left, node);
                return;
            }
            if let Some(right) = right.filter(|&r| self.nodes.get(r).can_lend(min_degree)) {
                self.borrow_from_right(parent, child_index, node, right);
                return;
            }
            match (left, right) {
                (Some(left), _) => self.merge(parent, child_index - 1, left, node),
                (None, Some(right)) => self.merge(parent, child_index, node, right),
                (None, None) => panic!("non-root node {node:?} has no siblings"),
            }

            if path.is_empty() {
                let root = self.nodes.get(parent).as_internal();
                if root.key_count() == 0 {
                    let only_child = root.child(0);
                    self.nodes.remove(parent);
                    self.root = Some(only_child);
                    tracing::trace!(old = ?parent, new = ?only_child, "collapse root");
                }
                return;
            }
            if !self.nodes.get(parent).is_underfull(min_degree) {
                return;
            }
            node = parent;
        }
    }

    fn borrow_from_left(&mut self, parent: Handle, child_index: usize, left: Handle, node: Handle)
    where
        K: Clone,
    {
        if self.nodes.get(node).is_leaf() {
            let (key, value) = self
                .nodes
                .get_mut(left)
                .as_leaf_mut()
                .pop()
                .expect("lending leaf is empty");
            let separator = key.clone();
            self.nodes.get_mut(node).as_leaf_mut().push_front(key, value);
            self.nodes.get_mut(parent).as_internal_mut().replace_key(child_index - 1, separator);
        } else {
            let (key, child) = self
                .nodes
                .get_mut(left)
                .as_internal_mut()
                .pop_child()
                .expect("lending internal node is empty");
            let separator = self.nodes.get_mut(parent).as_internal_mut().replace_key(child_index - 1, key);
            self.nodes.get_mut(node).as_internal_mut().push_child_front(child, separator);
        }
        tracing::trace!(from = ?left, to = ?node, "borrow from left sibling");
    }

    fn borrow_from_right(&mut self, parent: Handle, child_index: usize, node: Handle, right: Handle)
    where
        K: Clone,
    {
        if self.nodes.get(node).is_leaf() {
            let lender = self.nodes.get_mut(right).as_leaf_mut();
            let (key, value) = lender.pop_front().expect("lending leaf is empty");
            let separator = lender.key(0).clone();
            self.nodes.get_mut(node).as_leaf_mut().push(key, value);
            self.nodes.get_mut(parent).as_internal_mut().replace_key(child_index, separator);
        } else {
            let (child, key) = self
                .nodes
                .get_mut(right)
                .as_internal_mut()
                .pop_child_front()
                .expect("lending internal node is empty");
            let separator = self.nodes.get_mut(parent).as_internal_mut().replace_key(child_index, key);
            self.nodes.get_mut(node).as_internal_mut().push_child(separator, child);
        }
        tracing::trace!(from = ?right, to = ?node, "borrow from right sibling");
    }

    /// Folds `right` into `left`, dropping `keys[separator_index]` of `parent`.
    fn merge(&mut self, parent: Handle, separator_index: usize, left: Handle, right: Handle) {
        let (separator, removed) = self
            .nodes
            .get_mut(parent)
            .as_internal_mut()
            .remove_child(separator_index);
        debug_assert_eq!(removed, right);

        match self.nodes.remove(right) {
            // Leaf separators are copies; the entries stay in the leaves.
            Node::Leaf(right_leaf) => self.nodes.get_mut(left).as_leaf_mut().merge_with_right(right_leaf),
            Node::Internal(right_node) => self
                .nodes
                .get_mut(left)
                .as_internal_mut()
                .merge_with_right(separator, right_node),
        }
        tracing::trace!(?left, ?right, "merge siblings");
    }
}

impl<K: Ord, V> BPlusTree<K, V> {
    /// First position with key `>= key` (or `> key` when `strict`).
    fn bound<Q>(&self, key: &Q, strict: bool) -> Position
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.leaf_for(key)?;
        let index = self.nodes.get(leaf).as_leaf().bound(key, strict);
        self.normalize(leaf, index)
    }

    /// Checks leaf-level ordering against the separator bounds, collecting violations.
    fn check_node(
        &self,
        handle: Handle,
        depth: usize,
        bounds: (Option<&K>, Option<&K>),
        leaves: &mut Vec<(Handle, usize)>,
        errors: &mut Vec<String>,
    ) {
        let node = self.nodes.get(handle);
        let is_root = Some(handle) == self.root;
        let count = node.key_count();
        if !is_root && count < min_keys(self.min_degree) {
            errors.push(alloc::format!("node {handle:?} underfull: {count} keys"));
        }
        if count > max_keys(self.min_degree) {
            errors.push(alloc::format!("node {handle:?} overfull: {count} keys"));
        }

        let (low, high) = bounds;
        match node {
            Node::Leaf(leaf) => {
                for key in leaf.keys() {
                    if low.is_some_and(|low| key < low) || high.is_some_and(|high| key >= high) {
                        errors.push(alloc::format!("leaf {handle:?} holds a key outside its separators"));
                    }
                }
                leaves.push((handle, depth));
            }
            Node::Internal(internal) => {
                if count == 0 {
                    errors.push(alloc::format!("internal node {handle:?} has no separators"));
                }
                if internal.child_count() != count + 1 {
                    errors.push(alloc::format!(
                        "internal node {handle:?} has {count} keys but {} children",
                        internal.child_count()
                    ));
                }
                if internal.keys().windows(2).any(|pair| pair[0] >= pair[1]) {
                    errors.push(alloc::format!("separators of {handle:?} are not ascending"));
                }
                for (i, &child) in internal.children().iter().enumerate() {
                    let child_low = if i == 0 { low } else { Some(internal.key(i - 1)) };
                    let child_high = internal.keys().get(i).or(high);
                    self.check_node(child, depth + 1, (child_low, child_high), leaves, errors);
                }
            }
        }
    }

    /// Checks the chain links the leaves in tree order and that entries ascend along it.
    fn check_leaf_chain(&self, leaves: &[(Handle, usize)], errors: &mut Vec<String>) {
        if self.first_leaf != leaves.first().map(|&(h, _)| h) {
            errors.push(alloc::format!("leaf chain head {:?} is not the leftmost leaf", self.first_leaf));
        }
        for (i, &(leaf, _)) in leaves.iter().enumerate() {
            let expected = leaves.get(i + 1).map(|&(h, _)| h);
            let actual = self.nodes.get(leaf).as_leaf().next();
            if actual != expected {
                errors.push(alloc::format!("leaf {leaf:?} links to {actual:?}, expected {expected:?}"));
            }
        }

        let mut previous: Option<&K> = None;
        let mut count = 0;
        for (key, _) in self.chain() {
            if previous.is_some_and(|p| p >= key) {
                errors.push(String::from("leaf chain keys are not strictly ascending"));
                break;
            }
            previous = Some(key);
            count += 1;
        }
        if count != self.len {
            errors.push(alloc::format!("leaf chain holds {count} entries, len is {}", self.len));
        }
    }
}

impl<K: Ord + Clone, V> OrderedIndex<K, V> for BPlusTree<K, V> {
    type Range<'a>
        = Range<'a, K, V>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize {
        self.len
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        if self.contains_key(&key) {
            return false;
        }

        let root = match self.root {
            Some(root) => root,
            None => {
                let leaf = self.nodes.insert(Node::new_leaf());
                self.root = Some(leaf);
                self.first_leaf = Some(leaf);
                leaf
            }
        };
        let mut current = root;
        if self.nodes.get(root).is_full(self.min_degree) {
            let (separator, right) = self.split_child(root);
            current = self
                .nodes
                .insert(Node::Internal(InternalNode::with_children(root, separator, right)));
            self.root = Some(current);
            tracing::trace!(new_root = ?current, "grow root");
        }

        loop {
            let child_index = match self.nodes.get(current) {
                Node::Leaf(leaf) => {
                    let SearchResult::NotFound(index) = leaf.search(&key) else {
                        unreachable!("duplicate key reached a leaf");
                    };
                    self.nodes.get_mut(current).as_leaf_mut().insert(index, key, value);
                    break;
                }
                Node::Internal(internal) => internal.search_child(&key),
            };

            let child = self.nodes.get(current).as_internal().child(child_index);
            if !self.nodes.get(child).is_full(self.min_degree) {
                current = child;
                continue;
            }
            let (separator, right) = self.split_child(child);
            let go_right = key >= separator;
            self.nodes
                .get_mut(current)
                .as_internal_mut()
                .insert_child(child_index, separator, right);
            current = if go_right { right } else { child };
        }

        self.len += 1;
        true
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.nodes.get(self.leaf_for(key)?).as_leaf();
        match leaf.search(key) {
            SearchResult::Found(index) => Some(leaf.value(index)),
            SearchResult::NotFound(_) => None,
        }
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.leaf_for(key)?;
        let leaf = self.nodes.get_mut(handle).as_leaf_mut();
        match leaf.search(key) {
            SearchResult::Found(index) => Some(leaf.value_mut(index)),
            SearchResult::NotFound(_) => None,
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut path: Path = SmallVec::new();
        let mut current = self.root?;
        while let Node::Internal(internal) = self.nodes.get(current) {
            let child_index = internal.search_child(key);
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = internal.child(child_index);
        }

        let leaf = self.nodes.get_mut(current).as_leaf_mut();
        let SearchResult::Found(index) = leaf.search(key) else {
            return None;
        };
        let (_, value) = leaf.remove(index);
        self.len -= 1;

        if self.len == 0 {
            self.clear();
        } else if !path.is_empty() && self.nodes.get(current).is_underfull(self.min_degree) {
            self.rebalance(current, &mut path);
        }
        Some(value)
    }

    fn range<Q>(&self, low: &Q, high: &Q) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (front, end) = if low > high {
            (None, None)
        } else {
            (self.bound(low, false), self.bound(high, true))
        };
        Range {
            nodes: &self.nodes,
            front,
            end,
        }
    }

    fn iter(&self) -> Range<'_, K, V> {
        self.chain()
    }

    fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut current = self.root?;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(internal.child_count() - 1);
        }
        let leaf = self.nodes.get(current).as_leaf();
        leaf.key_count().checked_sub(1).map(|last| leaf.entry(last))
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.first_leaf = None;
        self.len = 0;
    }

    fn validate(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree has len {}", self.len);
            assert!(self.first_leaf.is_none(), "empty tree still has a leaf chain");
            assert!(self.nodes.is_empty(), "empty tree still holds {} nodes", self.nodes.len());
            return;
        };

        let mut errors: Vec<String> = Vec::new();
        let mut leaves = Vec::new();
        self.check_node(root, 0, (None, None), &mut leaves, &mut errors);

        if let Some(&(_, depth)) = leaves.first()
            && leaves.iter().any(|&(_, d)| d != depth)
        {
            errors.push(String::from("leaves are not all at the same depth"));
        }
        self.check_leaf_chain(&leaves, &mut errors);

        assert!(errors.is_empty(), "B+tree invariant violations:\n{}", errors.join("\n"));
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.chain()).finish()
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (leaf, index) = self.front.filter(|&position| Some(position) != self.end)?;
        let node = self.nodes.get(leaf).as_leaf();
        self.front = if index + 1 < node.key_count() {
            Some((leaf, index + 1))
        } else {
            node.next().map(|next| (next, 0))
        };
        Some(node.entry(index))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            end: self.end,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    fn keys(tree: &BPlusTree<i32, i32>) -> Vec<i32> {
        tree.iter().map(|(k, _)| *k).collect()
    }

    fn leaf_runs(tree: &BPlusTree<i32, i32>) -> Vec<Vec<i32>> {
        let mut runs = Vec::new();
        let mut current = tree.first_leaf;
        while let Some(handle) = current {
            let leaf = tree.nodes.get(handle).as_leaf();
            runs.push(leaf.keys().to_vec());
            current = leaf.next();
        }
        runs
    }

    #[test]
    fn rejects_degree_below_two() {
        assert!(matches!(
            BPlusTree::<i32, i32>::with_min_degree(1),
            Err(ConfigError::MinDegreeTooSmall { min_degree: 1 })
        ));
        assert_eq!(BPlusTree::<i32, i32>::with_min_degree(2).map(|t| t.min_degree()), Ok(2));
    }

    #[test]
    fn degree_three_scenario() {
        let mut tree = BPlusTree::with_min_degree(3).unwrap();
        for key in [3, 7, 1, 5, 11, 17, 13, 2, 19, 23] {
            assert!(tree.insert(key, key * 10));
            tree.validate();
        }
        let hits: Vec<(i32, i32)> = tree.range(&5, &15).map(|(k, v)| (*k, *v)).collect();
        assert_eq!(hits, [(5, 50), (7, 70), (11, 110), (13, 130)]);

        assert_eq!(tree.height(), 2);
        assert_eq!(leaf_runs(&tree), [vec![1, 2, 3], vec![5, 7], vec![11, 13, 17, 19, 23]]);
        let root = tree.nodes.get(tree.root.unwrap()).as_internal();
        assert_eq!(root.keys(), [5, 11]);
    }

    #[test]
    fn leaf_split_splices_the_chain() {
        let mut tree = BPlusTree::with_min_degree(2).unwrap();
        for key in [10, 20, 30] {
            tree.insert(key, key);
        }
        assert_eq!(leaf_runs(&tree), [vec![10, 20, 30]]);
        tree.insert(25, 25);
        assert_eq!(leaf_runs(&tree), [vec![10], vec![20, 25, 30]]);
        tree.insert(40, 40);
        assert_eq!(leaf_runs(&tree), [vec![10], vec![20], vec![25, 30, 40]]);
        tree.validate();
    }

    #[test]
    fn duplicate_insert_changes_nothing() {
        let mut tree: BPlusTree<i32, i32> = (0..5).map(|k| (k, k)).collect();
        let before = leaf_runs(&tree);
        // The root leaf is full; a duplicate must not split it.
        assert!(!tree.insert(3, 999));
        assert_eq!(leaf_runs(&tree), before);
        assert_eq!(tree.get(&3), Some(&3));
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn separator_keys_find_their_entries() {
        let mut tree = BPlusTree::with_min_degree(2).unwrap();
        for key in 0..64 {
            tree.insert(key, key);
        }
        tree.validate();
        for key in 0..64 {
            assert_eq!(tree.get(&key), Some(&key), "lost {key}");
        }
        assert_eq!(tree.range(&8, &8).count(), 1);
    }

    #[test]
    fn removal_borrows_merges_and_collapses() {
        let mut tree = BPlusTree::with_min_degree(2).unwrap();
        for key in 0..40 {
            tree.insert(key, key);
        }
        let tall = tree.height();
        for key in (0..40).step_by(2) {
            assert_eq!(tree.remove(&key), Some(key));
            tree.validate();
        }
        for key in (1..40).step_by(2).rev() {
            assert_eq!(tree.remove(&key), Some(key));
            tree.validate();
        }
        assert!(tall > 2);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.remove(&1), None);
    }

    #[test]
    fn range_edges() {
        let tree: BPlusTree<i32, i32> = (0..100).map(|k| (k * 2, k)).collect();
        assert_eq!(tree.range(&15, &10).count(), 0);
        assert_eq!(tree.range(&-10, &-1).count(), 0);
        assert_eq!(tree.range(&199, &500).count(), 0);
        assert_eq!(tree.range(&197, &500).map(|(k, _)| *k).collect::<Vec<_>>(), [198]);
        assert_eq!(tree.range(&0, &198).count(), 100);

        let range = tree.range(&10, &20);
        let first: Vec<i32> = range.clone().map(|(k, _)| *k).collect();
        assert_eq!(first, range.map(|(k, _)| *k).collect::<Vec<_>>());
    }

    #[test]
    fn leaf_chain_check_passes_on_a_healthy_tree() {
        let mut tree = BPlusTree::with_min_degree(2).unwrap();
        for key in (0..50).rev() {
            tree.insert(key, key);
        }
        let root = tree.root.unwrap();
        let mut leaves = Vec::new();
        let mut errors = Vec::new();
        tree.check_node(root, 0, (None, None), &mut leaves, &mut errors);
        tree.check_leaf_chain(&leaves, &mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(tree.chain().count(), 50);
        assert_eq!(alloc::format!("{tree:?}").matches(':').count(), 50);
    }

    #[test]
    fn last_key_value_follows_rightmost_spine() {
        let mut tree = BPlusTree::with_min_degree(2).unwrap();
        assert_eq!(tree.last_key_value(), None);
        for key in [5, 1, 9, 3, 7] {
            tree.insert(key, -key);
        }
        assert_eq!(tree.last_key_value(), Some((&9, &-9)));
        assert_eq!(tree.first_key_value(), Some((&1, &-1)));
    }

    // Test operations enum for property testing
    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..1000).prop_map(Op::Insert),
            2 => (0i32..1000).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn tree_invariants_maintained_after_operations(
            min_degree in 2usize..6,
            ops in prop::collection::vec(op_strategy(), 0..500),
        ) {
            let mut tree = BPlusTree::with_min_degree(min_degree).unwrap();
            let mut model = alloc::collections::BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        let fresh = !model.contains_key(&key);
                        if fresh {
                            model.insert(key, key);
                        }
                        prop_assert_eq!(tree.insert(key, key), fresh);
                    }
                    Op::Remove(key) => prop_assert_eq!(tree.remove(&key), model.remove(&key)),
                }
                tree.validate();
            }
            prop_assert_eq!(keys(&tree), model.keys().copied().collect::<Vec<_>>());
        }

        #[test]
        fn range_matches_model(
            input in prop::collection::vec(0i32..500, 0..300),
            low in -10i32..510,
            span in 0i32..120,
        ) {
            let tree: BPlusTree<i32, i32> = input.iter().map(|&k| (k, k)).collect();
            let model: alloc::collections::BTreeMap<i32, i32> = input.iter().map(|&k| (k, k)).collect();
            let high = low + span;
            let expected: Vec<i32> = model.range(low..=high).map(|(k, _)| *k).collect();
            prop_assert_eq!(tree.range(&low, &high).map(|(k, _)| *k).collect::<Vec<_>>(), expected);
        }
    }
}
