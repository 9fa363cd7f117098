//! Classic B-tree: entries in every node.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;

use smallvec::SmallVec;

use crate::config::checked_min_degree;
use crate::error::ConfigError;
use crate::index::OrderedIndex;
use crate::raw::{Arena, DEFAULT_MIN_DEGREE, Handle, max_keys, min_keys};

const INLINE_KEYS: usize = 2 * DEFAULT_MIN_DEGREE - 1;

#[derive(Clone)]
struct BTreeNode<K, V> {
    keys: SmallVec<[K; INLINE_KEYS]>,
    values: SmallVec<[V; INLINE_KEYS]>,
    // Empty for leaves; otherwise exactly `keys.len() + 1` handles.
    children: SmallVec<[Handle; INLINE_KEYS + 1]>,
}

impl<K, V> BTreeNode<K, V> {
    fn new() -> Self {
        Self {
            keys: SmallVec::new(),
            values: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn search<Q>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.keys.binary_search_by(|k| k.borrow().cmp(key))
    }
}

/// An ordered index kept as a B-tree of minimum degree `t`, with entries stored in
/// internal nodes as well as leaves.
///
/// Every non-root node holds between `t - 1` and `2t - 1` keys and all leaves sit at the
/// same depth. Both insertion and removal are single top-down passes: full children are
/// split before they are entered, and children at the minimum are topped up (by borrowing
/// through the parent or merging with a sibling) before they are entered.
///
/// # Examples
///
/// ```
/// use ordered_index::{BTree, OrderedIndex};
///
/// let mut tree = BTree::with_min_degree(2)?;
/// for key in 1..=10 {
///     tree.insert(key, key * key);
/// }
/// assert_eq!(tree.remove(&4), Some(16));
/// assert_eq!(tree.range(&3, &6).map(|(k, _)| *k).collect::<Vec<_>>(), [3, 5, 6]);
/// # Ok::<(), ordered_index::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct BTree<K, V> {
    nodes: Arena<BTreeNode<K, V>>,
    root: Option<Handle>,
    len: usize,
    min_degree: usize,
}

// (node, index of the next key to yield in it)
type Cursor = (Handle, usize);

/// Ascending iterator over a key range of a [`BTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    nodes: &'a Arena<BTreeNode<K, V>>,
    // Ancestors still owing a key, innermost last. The top always points at the next entry.
    stack: SmallVec<[Cursor; 16]>,
    end: Option<Cursor>,
}

impl<K, V> BTree<K, V> {
    /// Creates an empty tree of minimum degree 3.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
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
            current = self.nodes.get(handle).children.first().copied();
        }
        height
    }

    fn is_full(&self, handle: Handle) -> bool {
        self.nodes.get(handle).keys.len() >= max_keys(self.min_degree)
    }

    /// Splits the full child at `index` of `parent` around its median, which moves up.
    fn split_child(&mut self, parent: Handle, index: usize) {
        let mid = self.min_degree - 1;
        let child = self.nodes.get(parent).children[index];

        let node = self.nodes.get_mut(child);
        let mut right = BTreeNode::new();
        right.keys = node.keys.drain(mid + 1..).collect();
        right.values = node.values.drain(mid + 1..).collect();
        if !node.is_leaf() {
            right.children = node.children.drain(mid + 1..).collect();
        }
        let median_key = node.keys.pop().expect("`BTree::split_child()` - child has no median!");
        let median_value = node.values.pop().expect("`BTree::split_child()` - child has no median!");

        let right = self.nodes.insert(right);
        let parent_node = self.nodes.get_mut(parent);
        parent_node.keys.insert(index, median_key);
        parent_node.values.insert(index, median_value);
        parent_node.children.insert(index + 1, right);
        tracing::trace!(left = ?child, ?right, "split node");
    }

    /// Folds child `index + 1` of `parent` and the separator between them into child `index`.
    fn merge_children(&mut self, parent: Handle, index: usize) {
        let parent_node = self.nodes.get_mut(parent);
        let key = parent_node.keys.remove(index);
        let value = parent_node.values.remove(index);
        let right = parent_node.children.remove(index + 1);
        let left = parent_node.children[index];

        let mut right_node = self.nodes.remove(right);
        let left_node = self.nodes.get_mut(left);
        left_node.keys.push(key);
        left_node.values.push(value);
        left_node.keys.append(&mut right_node.keys);
        left_node.values.append(&mut right_node.values);
        left_node.children.append(&mut right_node.children);
        tracing::trace!(?left, ?right, "merge siblings");
    }

    /// Moves the separator left of child `index` down into it and the left sibling's last
    /// entry up into its place.
    fn rotate_from_left(&mut self, parent: Handle, index: usize) {
        let (left, child) = {
            let parent_node = self.nodes.get(parent);
            (parent_node.children[index - 1], parent_node.children[index])
        };
        let left_node = self.nodes.get_mut(left);
        let key = left_node.keys.pop().expect("lending node is empty");
        let value = left_node.values.pop().expect("lending node is empty");
        let grandchild = left_node.children.pop();

        let parent_node = self.nodes.get_mut(parent);
        let key = mem::replace(&mut parent_node.keys[index - 1], key);
        let value = mem::replace(&mut parent_node.values[index - 1], value);

        let child_node = self.nodes.get_mut(child);
        child_node.keys.insert(0, key);
        child_node.values.insert(0, value);
        if let Some(grandchild) = grandchild {
            child_node.children.insert(0, grandchild);
        }
        tracing::trace!(from = ?left, to = ?child, "borrow from left sibling");
    }

    /// Mirror of [`rotate_from_left`](Self::rotate_from_left).
    fn rotate_from_right(&mut self, parent: Handle, index: usize) {
        let (child, right) = {
            let parent_node = self.nodes.get(parent);
            (parent_node.children[index], parent_node.children[index + 1])
        };
        let right_node = self.nodes.get_mut(right);
        let key = right_node.keys.remove(0);
        let value = right_node.values.remove(0);
        let grandchild = (!right_node.is_leaf()).then(|| right_node.children.remove(0));

        let parent_node = self.nodes.get_mut(parent);
        let key = mem::replace(&mut parent_node.keys[index], key);
        let value = mem::replace(&mut parent_node.values[index], value);

        let child_node = self.nodes.get_mut(child);
        child_node.keys.push(key);
        child_node.values.push(value);
        if let Some(grandchild) = grandchild {
            child_node.children.push(grandchild);
        }
        tracing::trace!(from = ?right, to = ?child, "borrow from right sibling");
    }

    /// Makes sure child `index` of `parent` holds at least `t` keys before the removal
    /// descends into it. Returns the index of the child to descend into, which moves left
    /// when the child is merged into its left sibling.
    fn fill_child(&mut self, parent: Handle, index: usize) -> usize {
        let min_degree = self.min_degree;
        let parent_node = self.nodes.get(parent);
        let key_count = parent_node.keys.len();
        let child = parent_node.children[index];
        let left = index.checked_sub(1).map(|i| parent_node.children[i]);
        let right = (index < key_count).then(|| parent_node.children[index + 1]);

        if self.nodes.get(child).keys.len() >= min_degree {
            index
        } else if left.is_some_and(|l| self.nodes.get(l).keys.len() >= min_degree) {
            self.rotate_from_left(parent, index);
            index
        } else if right.is_some_and(|r| self.nodes.get(r).keys.len() >= min_degree) {
            self.rotate_from_right(parent, index);
            index
        } else if index < key_count {
            self.merge_children(parent, index);
            index
        } else {
            self.merge_children(parent, index - 1);
            index - 1
        }
    }

    /// Removes the largest entry below `handle`, which must hold at least `t` keys.
    fn remove_max(&mut self, mut handle: Handle) -> (K, V) {
        loop {
            let node = self.nodes.get(handle);
            if node.is_leaf() {
                let node = self.nodes.get_mut(handle);
                let key = node.keys.pop().expect("`BTree::remove_max()` - empty leaf!");
                let value = node.values.pop().expect("`BTree::remove_max()` - empty leaf!");
                return (key, value);
            }
            let last = node.keys.len();
            let index = self.fill_child(handle, last);
            handle = self.nodes.get(handle).children[index];
        }
    }

    /// Removes the smallest entry below `handle`, which must hold at least `t` keys.
    fn remove_min(&mut self, mut handle: Handle) -> (K, V) {
        loop {
            if self.nodes.get(handle).is_leaf() {
                let node = self.nodes.get_mut(handle);
                return (node.keys.remove(0), node.values.remove(0));
            }
            let index = self.fill_child(handle, 0);
            handle = self.nodes.get(handle).children[index];
        }
    }

    /// Replaces an emptied root by its only child, or drops it if it was a leaf.
    fn shrink_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let node = self.nodes.get(root);
        if !node.keys.is_empty() {
            return;
        }
        let only_child = node.children.first().copied();
        self.nodes.remove(root);
        self.root = only_child;
        tracing::trace!(old = ?root, new = ?only_child, "collapse root");
    }

    /// Checks one subtree, returning its entry count.
    fn check_node(&self, handle: Handle, depth: usize, bounds: (Option<&K>, Option<&K>), leaf_depth: &mut Option<usize>) -> usize
    where
        K: Ord,
    {
        let node = self.nodes.get(handle);
        let count = node.keys.len();
        if Some(handle) != self.root {
            assert!(count >= min_keys(self.min_degree), "node {handle:?} underfull: {count} keys");
        }
        assert!(count <= max_keys(self.min_degree), "node {handle:?} overfull: {count} keys");
        assert!(count > 0, "node {handle:?} is empty");
        assert_eq!(node.values.len(), count, "node {handle:?} has mismatched keys and values");
        assert!(node.keys.windows(2).all(|pair| pair[0] < pair[1]), "keys of {handle:?} are not ascending");

        let (low, high) = bounds;
        let first = &node.keys[0];
        let last = &node.keys[count - 1];
        assert!(low.is_none_or(|low| low < first), "node {handle:?} is not above its lower bound");
        assert!(high.is_none_or(|high| last < high), "node {handle:?} is not below its upper bound");

        if node.is_leaf() {
            let expected = *leaf_depth.get_or_insert(depth);
            assert_eq!(depth, expected, "leaf {handle:?} is at depth {depth}, expected {expected}");
            return count;
        }

        assert_eq!(node.children.len(), count + 1, "node {handle:?} has a wrong number of children");
        let mut total = count;
        for (i, &child) in node.children.iter().enumerate() {
            let child_low = if i == 0 { low } else { Some(&node.keys[i - 1]) };
            let child_high = node.keys.get(i).or(high);
            total += self.check_node(child, depth + 1, (child_low, child_high), leaf_depth);
        }
        total
    }
}

impl<K: Ord, V> BTree<K, V> {
    /// Cursor stack positioned on the first key `>= low`.
    fn seek<Q>(&self, low: &Q) -> SmallVec<[Cursor; 16]>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut stack = SmallVec::new();
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            match node.search(low) {
                Ok(index) => {
                    stack.push((handle, index));
                    break;
                }
                Err(index) => {
                    stack.push((handle, index));
                    current = node.children.get(index).copied();
                }
            }
        }
        normalize(&self.nodes, &mut stack);
        stack
    }

    /// Position of the first key `> high`, or `None` past the end.
    fn upper_bound<Q>(&self, high: &Q) -> Option<Cursor>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let index = node.keys.partition_point(|k| k.borrow() <= high);
            if index < node.keys.len() {
                candidate = Some((handle, index));
            }
            current = node.children.get(index).copied();
        }
        candidate
    }
}

/// Pushes the leftmost path below `handle`.
fn descend_left<K, V>(nodes: &Arena<BTreeNode<K, V>>, stack: &mut SmallVec<[Cursor; 16]>, mut handle: Handle) {
    loop {
        stack.push((handle, 0));
        match nodes.get(handle).children.first() {
            Some(&child) => handle = child,
            None => return,
        }
    }
}

/// Pops cursors that have yielded every key of their node.
fn normalize<K, V>(nodes: &Arena<BTreeNode<K, V>>, stack: &mut SmallVec<[Cursor; 16]>) {
    while let Some(&(handle, index)) = stack.last() {
        if index < nodes.get(handle).keys.len() {
            return;
        }
        stack.pop();
    }
}

impl<K: Ord, V> OrderedIndex<K, V> for BTree<K, V> {
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

        let Some(mut current) = self.root else {
            let mut leaf = BTreeNode::new();
            leaf.keys.push(key);
            leaf.values.push(value);
            self.root = Some(self.nodes.insert(leaf));
            self.len = 1;
            return true;
        };

        if self.is_full(current) {
            let mut new_root = BTreeNode::new();
            new_root.children.push(current);
            current = self.nodes.insert(new_root);
            self.root = Some(current);
            self.split_child(current, 0);
            tracing::trace!(new_root = ?current, "grow root");
        }

        loop {
            let node = self.nodes.get(current);
            let Err(mut index) = node.search(&key) else {
                unreachable!("duplicate key reached insertion");
            };
            if node.is_leaf() {
                let node = self.nodes.get_mut(current);
                node.keys.insert(index, key);
                node.values.insert(index, value);
                break;
            }
            if self.is_full(node.children[index]) {
                self.split_child(current, index);
                if key > self.nodes.get(current).keys[index] {
                    index += 1;
                }
            }
            current = self.nodes.get(current).children[index];
        }

        self.len += 1;
        true
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                Ok(index) => return Some(&node.values[index]),
                Err(index) => current = *node.children.get(index)?,
            }
        }
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        let index = loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                Ok(index) => break index,
                Err(index) => current = *node.children.get(index)?,
            }
        };
        Some(&mut self.nodes.get_mut(current).values[index])
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if !self.contains_key(key) {
            return None;
        }

        let mut current = self.root?;
        let value = loop {
            let node = self.nodes.get(current);
            match node.search(key) {
                Ok(index) if node.is_leaf() => {
                    let node = self.nodes.get_mut(current);
                    node.keys.remove(index);
                    break node.values.remove(index);
                }
                Ok(index) => {
                    let (left, right) = (node.children[index], node.children[index + 1]);
                    let replacement = if self.nodes.get(left).keys.len() >= self.min_degree {
                        self.remove_max(left)
                    } else if self.nodes.get(right).keys.len() >= self.min_degree {
                        self.remove_min(right)
                    } else {
                        // The key moves down into the merged child; keep chasing it.
                        self.merge_children(current, index);
                        current = left;
                        continue;
                    };
                    let node = self.nodes.get_mut(current);
                    node.keys[index] = replacement.0;
                    break mem::replace(&mut node.values[index], replacement.1);
                }
                Err(index) => {
                    let index = self.fill_child(current, index);
                    current = self.nodes.get(current).children[index];
                }
            }
        };

        self.len -= 1;
        self.shrink_root();
        Some(value)
    }

    fn range<Q>(&self, low: &Q, high: &Q) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if low > high {
            return Range {
                nodes: &self.nodes,
                stack: SmallVec::new(),
                end: None,
            };
        }
        Range {
            nodes: &self.nodes,
            stack: self.seek(low),
            end: self.upper_bound(high),
        }
    }

    fn iter(&self) -> Range<'_, K, V> {
        let mut stack = SmallVec::new();
        if let Some(root) = self.root {
            descend_left(&self.nodes, &mut stack, root);
        }
        Range {
            nodes: &self.nodes,
            stack,
            end: None,
        }
    }

    fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.nodes.get(self.root?);
        while let Some(&child) = node.children.last() {
            node = self.nodes.get(child);
        }
        Some((node.keys.last()?, node.values.last()?))
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    fn validate(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree has len {}", self.len);
            assert!(self.nodes.is_empty(), "empty tree still holds {} nodes", self.nodes.len());
            return;
        };
        let counted = self.check_node(root, 0, (None, None), &mut None);
        assert_eq!(counted, self.len, "tree holds {counted} entries, len is {}", self.len);
    }
}

impl<K, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = SmallVec::new();
        if let Some(root) = self.root {
            descend_left(&self.nodes, &mut stack, root);
        }
        let iter = Range {
            nodes: &self.nodes,
            stack,
            end: None,
        };
        f.debug_map().entries(iter).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for BTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (handle, index) = *self.stack.last().filter(|&&cursor| Some(cursor) != self.end)?;
        let nodes = self.nodes;
        let node = nodes.get(handle);

        if let Some(top) = self.stack.last_mut() {
            top.1 += 1;
        }
        match node.children.get(index + 1) {
            Some(&child) => descend_left(nodes, &mut self.stack, child),
            None => normalize(nodes, &mut self.stack),
        }
        Some((&node.keys[index], &node.values[index]))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            stack: self.stack.clone(),
            end: self.end,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn keys(tree: &BTree<i32, i32>) -> Vec<i32> {
        tree.iter().map(|(k, _)| *k).collect()
    }

    fn root_keys(tree: &BTree<i32, i32>) -> Vec<i32> {
        tree.nodes.get(tree.root.unwrap()).keys.to_vec()
    }

    #[test]
    fn full_root_splits_on_the_way_down() {
        let mut tree = BTree::with_min_degree(2).unwrap();
        for key in [10, 20, 30] {
            tree.insert(key, key);
        }
        assert_eq!(tree.height(), 1);
        tree.insert(40, 40);
        tree.validate();
        assert_eq!(tree.height(), 2);
        assert_eq!(root_keys(&tree), [20]);
        assert_eq!(keys(&tree), [10, 20, 30, 40]);
    }

    #[test]
    fn generic_scenario() {
        let mut tree = BTree::new();
        for key in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(key, key);
        }
        tree.validate();
        assert_eq!(tree.get(&40), Some(&40));
        assert_eq!(tree.get(&90), None);
    }

    #[test]
    fn duplicate_insert_does_not_split() {
        let mut tree: BTree<i32, i32> = (0..5).map(|k| (k, k)).collect();
        assert_eq!(tree.height(), 1);
        assert!(!tree.insert(2, 99));
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.get(&2), Some(&2));
    }

    #[test]
    fn removing_internal_keys_uses_neighbours() {
        let mut tree: BTree<i32, i32> = BTree::with_min_degree(2).unwrap();
        tree.extend((1..=20).map(|k| (k, k)));
        let separators = root_keys(&tree);
        for &key in &separators {
            assert_eq!(tree.remove(&key), Some(key));
            tree.validate();
        }
        assert_eq!(tree.len(), 20 - separators.len());
        assert!(separators.iter().all(|key| !tree.contains_key(key)));
        for key in 1..=20 {
            tree.remove(&key);
            tree.validate();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn missing_key_removal_is_a_no_op() {
        let mut tree: BTree<i32, i32> = BTree::with_min_degree(2).unwrap();
        tree.extend((0..10).map(|k| (k * 2, k)));
        let height = tree.height();
        assert_eq!(tree.remove(&7), None);
        assert_eq!(tree.height(), height);
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn range_crosses_levels() {
        let tree: BTree<i32, i32> = (0..200).map(|k| (k, k)).collect();
        assert_eq!(tree.range(&37, &45).map(|(k, _)| *k).collect::<Vec<_>>(), (37..=45).collect::<Vec<_>>());
        assert_eq!(tree.range(&45, &37).count(), 0);
        assert_eq!(tree.range(&199, &1000).count(), 1);
        assert_eq!(tree.range(&200, &1000).count(), 0);
        assert_eq!(tree.last_key_value(), Some((&199, &199)));
    }

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
            let mut tree = BTree::with_min_degree(min_degree).unwrap();
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
            let tree: BTree<i32, i32> = input.iter().map(|&k| (k, k)).collect();
            let model: alloc::collections::BTreeMap<i32, i32> = input.iter().map(|&k| (k, k)).collect();
            let high = low + span;
            let expected: Vec<i32> = model.range(low..=high).map(|(k, _)| *k).collect();
            prop_assert_eq!(tree.range(&low, &high).map(|(k, _)| *k).collect::<Vec<_>>(), expected);
        }
    }
}
