use core::borrow::Borrow;

use smallvec::SmallVec;

use super::handle::Handle;

/// Minimum degree used when none is configured.
pub(crate) const DEFAULT_MIN_DEGREE: usize = 3;

// Nodes at the default degree never spill to the heap.
const INLINE_KEYS: usize = 2 * DEFAULT_MIN_DEGREE - 1;
const INLINE_CHILDREN: usize = 2 * DEFAULT_MIN_DEGREE;

/// Largest key count a node of minimum degree `t` may hold.
#[inline]
pub(crate) const fn max_keys(min_degree: usize) -> usize {
    2 * min_degree - 1
}

/// Smallest key count a non-root node of minimum degree `t` may hold.
#[inline]
pub(crate) const fn min_keys(min_degree: usize) -> usize {
    min_degree - 1
}

#[derive(Clone)]
#[allow(clippy::large_enum_variant)]
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

// B+Tree: internal nodes store separator keys and child handles, never values.
#[derive(Clone)]
pub(crate) struct InternalNode<K> {
    // child[i] holds keys < keys[i]; child[i + 1] holds keys >= keys[i].
    keys: SmallVec<[K; INLINE_KEYS]>,
    children: SmallVec<[Handle; INLINE_CHILDREN]>,
}

// B+Tree: leaf nodes store the entries and the forward link of the leaf chain.
#[derive(Clone)]
pub(crate) struct LeafNode<K, V> {
    next: Option<Handle>,
    keys: SmallVec<[K; INLINE_KEYS]>,
    values: SmallVec<[V; INLINE_KEYS]>,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K, V> Node<K, V> {
    pub(crate) fn new_leaf() -> Self {
        Node::Leaf(LeafNode::new())
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the internal node, panicking if this is not internal.
    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node mutably, panicking if this is not internal.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        match self {
            Node::Internal(internal) => internal.key_count(),
            Node::Leaf(leaf) => leaf.key_count(),
        }
    }

    /// True when the node holds `2t - 1` keys and must split before anything descends into it.
    pub(crate) fn is_full(&self, min_degree: usize) -> bool {
        self.key_count() >= max_keys(min_degree)
    }

    /// True when the node can give a key to a sibling and stay at or above `t - 1`.
    pub(crate) fn can_lend(&self, min_degree: usize) -> bool {
        self.key_count() > min_keys(min_degree)
    }

    /// True when a non-root node has dropped below `t - 1` keys.
    pub(crate) fn is_underfull(&self, min_degree: usize) -> bool {
        self.key_count() < min_keys(min_degree)
    }
}

impl<K> InternalNode<K> {
    /// Creates the new root above a split: `left`, `separator`, `right`.
    pub(crate) fn with_children(left: Handle, separator: K, right: Handle) -> Self {
        let mut node = Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
        };
        node.keys.push(separator);
        node.children.push(left);
        node.children.push(right);
        node
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Index of the child whose subtree may contain `key`.
    #[inline]
    pub(crate) fn search_child<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        // Equal keys live to the right of their separator.
        self.keys.partition_point(|k| k.borrow() <= key)
    }

    /// Inserts `key` at `index` with `child` immediately to its right.
    pub(crate) fn insert_child(&mut self, index: usize, key: K, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes `keys[index]` together with the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Appends a key and the child to its right.
    pub(crate) fn push_child(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Prepends a child and the key to its right.
    pub(crate) fn push_child_front(&mut self, child: Handle, key: K) {
        self.children.insert(0, child);
        self.keys.insert(0, key);
    }

    /// Removes the last key and the last child.
    pub(crate) fn pop_child(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Removes the first child and the key to its right.
    pub(crate) fn pop_child_front(&mut self) -> Option<(Handle, K)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.children.remove(0), self.keys.remove(0)))
    }

    /// Replaces the separator at `index`, returning the old one.
    pub(crate) fn replace_key(&mut self, index: usize, key: K) -> K {
        core::mem::replace(&mut self.keys[index], key)
    }

    /// Splits a full node around its median. Both halves keep `t - 1` keys and the median
    /// is returned for the parent.
    pub(crate) fn split(&mut self, min_degree: usize) -> (K, InternalNode<K>) {
        let mid = min_degree - 1;
        let keys: SmallVec<[K; INLINE_KEYS]> = self.keys.drain(mid + 1..).collect();
        let children = self.children.drain(mid + 1..).collect();
        let median = self
            .keys
            .pop()
            .expect("`InternalNode::split()` - node has no median!");
        (median, InternalNode { keys, children })
    }

    /// Absorbs a right sibling, pulling `separator` down between the two key runs.
    pub(crate) fn merge_with_right(&mut self, separator: K, mut right: InternalNode<K>) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            next: None,
            keys: SmallVec::new(),
            values: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> (&K, &V) {
        (&self.keys[index], &self.values[index])
    }

    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(idx) => SearchResult::Found(idx),
            Err(idx) => SearchResult::NotFound(idx),
        }
    }

    /// Index of the first key `>= key` (or `> key` when `strict`).
    pub(crate) fn bound<Q>(&self, key: &Q, strict: bool) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if strict {
            self.keys.partition_point(|k| k.borrow() <= key)
        } else {
            self.keys.partition_point(|k| k.borrow() < key)
        }
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, V) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    pub(crate) fn push(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    pub(crate) fn pop(&mut self) -> Option<(K, V)> {
        let key = self.keys.pop()?;
        let value = self.values.pop()?;
        Some((key, value))
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        if self.keys.is_empty() {
            return None;
        }
        Some((self.keys.remove(0), self.values.remove(0)))
    }

    /// Splits a full leaf: the left keeps `t - 1` entries and the right takes `t`.
    /// Returns a copy of the right half's first key as the separator. The caller splices
    /// the right half into the chain.
    pub(crate) fn split(&mut self, min_degree: usize) -> (K, LeafNode<K, V>)
    where
        K: Clone,
    {
        let mid = min_degree - 1;
        let right = LeafNode {
            next: self.next,
            keys: self.keys.drain(mid..).collect(),
            values: self.values.drain(mid..).collect(),
        };
        let separator = right.keys[0].clone();
        (separator, right)
    }

    /// Absorbs a right sibling and takes over its place in the chain.
    pub(crate) fn merge_with_right(&mut self, mut right: LeafNode<K, V>) {
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.next = right.next;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn leaf_with(keys: &[i32]) -> LeafNode<i32, i32> {
        let mut leaf = LeafNode::new();
        for &key in keys {
            leaf.push(key, key * 10);
        }
        leaf
    }

    #[test]
    fn capacity_bounds() {
        assert_eq!((min_keys(2), max_keys(2)), (1, 3));
        assert_eq!((min_keys(3), max_keys(3)), (2, 5));

        let node: Node<i32, i32> = Node::Leaf(leaf_with(&[1, 2, 3, 4, 5]));
        assert!(node.is_full(3));
        assert!(node.can_lend(3));
        assert!(!Node::<i32, i32>::new_leaf().can_lend(2));
        assert!(Node::<i32, i32>::new_leaf().is_underfull(3));
    }

    #[test]
    fn leaf_split_copies_right_minimum() {
        let mut left = leaf_with(&[1, 2, 3, 4, 5]);
        let (separator, right) = left.split(3);
        assert_eq!(separator, 3);
        assert_eq!(left.keys(), [1, 2]);
        assert_eq!(right.keys(), [3, 4, 5]);
        assert_eq!(*right.value(0), 30);
    }

    #[test]
    fn internal_split_moves_median_up() {
        let handles: alloc::vec::Vec<Handle> = (1..=6).map(Handle::new).collect();
        let mut node = InternalNode::with_children(handles[0], 10, handles[1]);
        for (i, key) in [20, 30, 40, 50].into_iter().enumerate() {
            node.push_child(key, handles[i + 2]);
        }
        let (median, right) = node.split(3);
        assert_eq!(median, 30);
        assert_eq!(node.keys(), [10, 20]);
        assert_eq!(right.keys(), [40, 50]);
        assert_eq!(node.child_count(), 3);
        assert_eq!(right.children(), &handles[3..]);
    }

    #[test]
    fn search_child_sends_equal_keys_right() {
        let node = InternalNode::with_children(Handle::new(1), 10, Handle::new(2));
        assert_eq!(node.search_child(&9), 0);
        assert_eq!(node.search_child(&10), 1);
        assert_eq!(node.search_child(&11), 1);
    }

    #[test]
    fn leaf_bounds() {
        let leaf = leaf_with(&[2, 4, 6]);
        assert_eq!(leaf.bound(&4, false), 1);
        assert_eq!(leaf.bound(&4, true), 2);
        assert_eq!(leaf.bound(&7, false), 3);
        assert!(matches!(leaf.search(&5), SearchResult::NotFound(2)));
    }
}
