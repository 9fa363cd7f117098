//! Red-black tree.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::index::OrderedIndex;
use crate::order_statistic::OrderStatistic;
use crate::raw::{Augment, BinaryTree, Entries, Handle, Lookup, Side};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

impl Augment for Color {}

/// An ordered index kept as a red-black tree.
///
/// No red node has a red child and every path from a node down to an absent child crosses
/// the same number of black nodes; absent children count as black. Fix-ups climb through
/// the parent back-references, recoloring where the uncle (or sibling) allows and rotating
/// at most twice per insert and three times per removal.
///
/// # Examples
///
/// ```
/// use ordered_index::{OrderedIndex, RedBlackTree};
///
/// let mut tree = RedBlackTree::new();
/// for key in [50, 30, 70, 20, 40, 60, 80] {
///     tree.insert(key, key.to_string());
/// }
/// assert_eq!(tree.get(&40).map(String::as_str), Some("40"));
/// assert!(tree.get(&90).is_none());
/// ```
#[derive(Clone)]
pub struct RedBlackTree<K, V> {
    tree: BinaryTree<K, V, Color>,
}

/// Ascending iterator over a key range of a [`RedBlackTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    inner: Entries<'a, K, V, Color>,
}

impl<K, V> RedBlackTree<K, V> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { tree: BinaryTree::new() }
    }

    fn is_red(&self, handle: Option<Handle>) -> bool {
        self.tree.meta_of(handle) == Some(Color::Red)
    }

    fn paint(&mut self, handle: Handle, color: Color) {
        self.tree.set_meta(handle, color);
    }

    /// Restores the red-black rules after `node` was attached red.
    fn fix_insert(&mut self, mut node: Handle) {
        loop {
            let Some(parent) = self.tree.parent(node) else {
                self.paint(node, Color::Black);
                return;
            };
            if !self.is_red(Some(parent)) {
                return;
            }

            let grandparent = self.tree.parent(parent).expect("red node at the root");
            let parent_side = self.tree.side_of(parent).unwrap_or(Side::Left);
            let uncle = self.tree.child(grandparent, parent_side.opposite());

            if let Some(uncle) = uncle.filter(|&u| self.is_red(Some(u))) {
                self.paint(parent, Color::Black);
                self.paint(uncle, Color::Black);
                self.paint(grandparent, Color::Red);
                node = grandparent;
                continue;
            }

            // Straighten a zig-zag so the red pair lines up on `parent_side`.
            let mut parent = parent;
            if self.tree.side_of(node) == Some(parent_side.opposite()) {
                parent = self.tree.rotate(parent, parent_side);
            }
            self.paint(parent, Color::Black);
            self.paint(grandparent, Color::Red);
            self.tree.rotate(grandparent, parent_side.opposite());
            return;
        }
    }

    /// Repairs a missing black on the path through `node`, the child of `parent` that
    /// replaced a removed black node. `node` may be absent.
    fn fix_remove(&mut self, mut node: Option<Handle>, mut parent: Option<Handle>) {
        while node != self.tree.root() && !self.is_red(node) {
            let p = parent.expect("double-black node without parent");
            let side = if self.tree.child(p, Side::Left) == node {
                Side::Left
            } else {
                Side::Right
            };
            let mut sibling = self
                .tree
                .child(p, side.opposite())
                .expect("double-black node without sibling");

            if self.is_red(Some(sibling)) {
                self.paint(sibling, Color::Black);
                self.paint(p, Color::Red);
                self.tree.rotate(p, side);
                sibling = self.tree.child(p, side.opposite()).expect("rotation lost the sibling");
            }

            let near = self.tree.child(sibling, side);
            let far = self.tree.child(sibling, side.opposite());
            if !self.is_red(near) && !self.is_red(far) {
                self.paint(sibling, Color::Red);
                node = Some(p);
                parent = self.tree.parent(p);
                continue;
            }

            if !self.is_red(far) {
                self.paint(near.expect("red near nephew is absent"), Color::Black);
                self.paint(sibling, Color::Red);
                sibling = self.tree.rotate(sibling, side.opposite());
            }
            let parent_color = self.tree.meta(p);
            self.paint(sibling, parent_color);
            self.paint(p, Color::Black);
            if let Some(far) = self.tree.child(sibling, side.opposite()) {
                self.paint(far, Color::Black);
            }
            self.tree.rotate(p, side);
            node = self.tree.root();
            break;
        }

        if let Some(node) = node {
            self.paint(node, Color::Black);
        }
    }

    /// Returns the black-height of the subtree, checking both coloring rules on the way.
    fn check_colors(&self, handle: Option<Handle>) -> usize {
        let Some(h) = handle else {
            return 1;
        };
        let left = self.tree.child(h, Side::Left);
        let right = self.tree.child(h, Side::Right);
        if self.is_red(Some(h)) {
            assert!(
                !self.is_red(left) && !self.is_red(right),
                "red node {h:?} has a red child"
            );
        }
        let left_height = self.check_colors(left);
        let right_height = self.check_colors(right);
        assert_eq!(left_height, right_height, "black-height differs below {h:?}");
        left_height + usize::from(!self.is_red(Some(h)))
    }
}

impl<K: Ord, V> OrderedIndex<K, V> for RedBlackTree<K, V> {
    type Range<'a>
        = Range<'a, K, V>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        let Lookup::Vacant { parent, side } = self.tree.lookup(&key) else {
            return false;
        };
        let node = self.tree.attach(parent, side, key, value, Color::Red);
        self.fix_insert(node);
        true
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.find(key).map(|h| self.tree.value(h))
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.tree.find(key)?;
        Some(self.tree.value_mut(handle))
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let found = self.tree.find(key)?;
        let target = match self.tree.child(found, Side::Right) {
            Some(right) if self.tree.child(found, Side::Left).is_some() => {
                let successor = self.tree.extreme(right, Side::Left);
                self.tree.swap_payload(found, successor);
                successor
            }
            _ => found,
        };
        let detached = self.tree.detach(target);
        if detached.meta == Color::Black {
            self.fix_remove(detached.replacement, detached.parent);
        }
        Some(detached.value)
    }

    fn range<Q>(&self, low: &Q, high: &Q) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        Range {
            inner: self.tree.range(low, high),
        }
    }

    fn iter(&self) -> Range<'_, K, V> {
        Range {
            inner: self.tree.entries(),
        }
    }

    fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|h| self.tree.entry(h))
    }

    fn clear(&mut self) {
        self.tree.clear();
    }

    fn validate(&self) {
        self.tree.check_structure();
        assert!(!self.is_red(self.tree.root()), "red root");
        self.check_colors(self.tree.root());
    }
}

impl<K: Ord, V> OrderStatistic<K, V> for RedBlackTree<K, V> {
    fn get_by_rank(&self, rank: usize) -> Option<(&K, &V)> {
        self.tree.select(rank).map(|h| self.tree.entry(h))
    }

    fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.rank_of(key)
    }
}

impl<K, V> Default for RedBlackTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RedBlackTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tree.entries()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for RedBlackTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RedBlackTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    #[test]
    fn root_is_black_and_children_recolored() {
        let mut tree = RedBlackTree::new();
        for key in [10, 5, 15, 1] {
            tree.insert(key, ());
        }
        tree.validate();
        let root = tree.tree.root().unwrap();
        assert_eq!(tree.tree.meta(root), Color::Black);
        // Inserting 1 under a red parent with a red uncle pushes the red up to the root,
        // which is then painted black again.
        assert_eq!(tree.tree.meta(tree.tree.find(&5).unwrap()), Color::Black);
        assert_eq!(tree.tree.meta(tree.tree.find(&15).unwrap()), Color::Black);
        assert_eq!(tree.tree.meta(tree.tree.find(&1).unwrap()), Color::Red);
    }

    #[test]
    fn zig_zag_insert_rotates_twice() {
        let mut tree = RedBlackTree::new();
        for key in [10, 5, 7] {
            tree.insert(key, ());
        }
        tree.validate();
        assert_eq!(*tree.tree.key(tree.tree.root().unwrap()), 7);
    }

    #[test]
    fn draining_in_every_order_keeps_colors_valid() {
        for start in 0..16 {
            let mut tree: RedBlackTree<i32, i32> = (0..16).map(|k| (k, k)).collect();
            for step in 0..16 {
                let key = (start + step * 5) % 16;
                assert_eq!(tree.remove(&key), Some(key));
                tree.validate();
            }
            assert!(tree.is_empty());
        }
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..400).prop_map(Op::Insert),
            2 => (0i32..400).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn colors_valid_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree = RedBlackTree::new();
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
            let keys: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(keys, model.keys().copied().collect::<Vec<_>>());
        }
    }
}
