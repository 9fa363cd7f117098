//! Weak AVL tree.
//!
//! Terminology follows the rank-balanced tree literature: the rank difference of a child is
//! `rank(parent) - rank(child)`, a child with difference `i` is an *i-child*, and a node is
//! *i,j* when its children are an i-child and a j-child. Absent children have rank -1.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::index::OrderedIndex;
use crate::order_statistic::OrderStatistic;
use crate::raw::{Augment, BinaryTree, Entries, Handle, Lookup, Side};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Rank(i16);

impl Augment for Rank {}

/// An ordered index kept as a weak AVL (WAVL) tree.
///
/// Every rank difference is 1 or 2 and every leaf has rank 0. Built by insertions alone the
/// tree is shaped exactly like an AVL tree; removals only ever demote, and at most two
/// rotations are needed per removal.
///
/// # Examples
///
/// ```
/// use ordered_index::{OrderedIndex, WavlTree};
///
/// let mut tree: WavlTree<u32, &str> = [(2, "b"), (1, "a"), (3, "c")].into_iter().collect();
/// assert_eq!(tree.remove(&2), Some("b"));
/// assert_eq!(tree.first_key_value(), Some((&1, &"a")));
/// ```
#[derive(Clone)]
pub struct WavlTree<K, V> {
    tree: BinaryTree<K, V, Rank>,
}

/// Ascending iterator over a key range of a [`WavlTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    inner: Entries<'a, K, V, Rank>,
}

impl<K, V> WavlTree<K, V> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { tree: BinaryTree::new() }
    }

    fn rank(&self, handle: Option<Handle>) -> i16 {
        self.tree.meta_of(handle).map_or(-1, |r| r.0)
    }

    fn rank_diff(&self, parent: Handle, child: Option<Handle>) -> i16 {
        self.rank(Some(parent)) - self.rank(child)
    }

    fn promote(&mut self, handle: Handle) {
        let rank = self.rank(Some(handle));
        self.tree.set_meta(handle, Rank(rank + 1));
    }

    fn demote(&mut self, handle: Handle) {
        let rank = self.rank(Some(handle));
        self.tree.set_meta(handle, Rank(rank - 1));
    }

    /// Walks up from a freshly attached rank-0 leaf, promoting 0,1 parents and finishing
    /// with at most one single or double rotation at a 0,2 parent.
    fn fix_insert(&mut self, mut node: Handle) {
        while let Some(parent) = self.tree.parent(node) {
            if self.rank_diff(parent, Some(node)) != 0 {
                return;
            }
            let side = self.tree.side_of(node).unwrap_or(Side::Left);
            let sibling = self.tree.child(parent, side.opposite());
            if self.rank_diff(parent, sibling) == 1 {
                self.promote(parent);
                node = parent;
                continue;
            }

            let inner = self.tree.child(node, side.opposite());
            match inner.filter(|&i| self.rank_diff(node, Some(i)) == 1) {
                Some(inner) => {
                    self.tree.rotate_up(inner);
                    self.tree.rotate_up(inner);
                    self.promote(inner);
                    self.demote(node);
                    self.demote(parent);
                }
                None => {
                    self.tree.rotate_up(node);
                    self.demote(parent);
                }
            }
            return;
        }
    }

    /// Restores rank rules after the child on `side` of `parent` was removed or replaced.
    fn fix_remove(&mut self, parent: Option<Handle>, mut side: Side) {
        let Some(mut parent) = parent else {
            return;
        };

        // A leaf of rank 1 is 2,2: demote it, which may leave it a 3-child of its own parent.
        if self.tree.is_leaf(parent) && self.rank(Some(parent)) == 1 {
            self.demote(parent);
            let Some(grandparent) = self.tree.parent(parent) else {
                return;
            };
            side = self.tree.side_of(parent).unwrap_or(Side::Left);
            parent = grandparent;
        }

        loop {
            let node = self.tree.child(parent, side);
            if self.rank_diff(parent, node) != 3 {
                return;
            }
            let sibling = self
                .tree
                .child(parent, side.opposite())
                .expect("3-child without a sibling");

            let sibling_is_2_2 = self.rank_diff(sibling, self.tree.child(sibling, Side::Left)) == 2
                && self.rank_diff(sibling, self.tree.child(sibling, Side::Right)) == 2;
            if self.rank_diff(parent, Some(sibling)) == 2 {
                self.demote(parent);
            } else if sibling_is_2_2 {
                self.demote(sibling);
                self.demote(parent);
            } else {
                self.rotate_after_remove(parent, side, sibling);
                return;
            }

            let Some(grandparent) = self.tree.parent(parent) else {
                return;
            };
            side = self.tree.side_of(parent).unwrap_or(Side::Left);
            parent = grandparent;
        }
    }

    /// Terminal case of removal: `parent` has a 3-child on `side` and a 1-child `sibling`
    /// that is not 2,2.
    fn rotate_after_remove(&mut self, parent: Handle, side: Side, sibling: Handle) {
        let far = self.tree.child(sibling, side.opposite());
        if self.rank_diff(sibling, far) == 1 {
            self.tree.rotate(parent, side);
            self.promote(sibling);
            self.demote(parent);
            if self.tree.is_leaf(parent) {
                self.demote(parent);
            }
        } else {
            let near = self
                .tree
                .child(sibling, side)
                .expect("sibling with a 2-child far side must have a near child");
            self.tree.rotate_up(near);
            self.tree.rotate_up(near);
            self.promote(near);
            self.promote(near);
            self.demote(sibling);
            self.demote(parent);
            self.demote(parent);
        }
    }

    fn check_ranks(&self, handle: Option<Handle>) {
        let Some(h) = handle else {
            return;
        };
        for side in [Side::Left, Side::Right] {
            let child = self.tree.child(h, side);
            let diff = self.rank_diff(h, child);
            assert!(diff == 1 || diff == 2, "rank difference {diff} below {h:?} on {side:?}");
            self.check_ranks(child);
        }
        if self.tree.is_leaf(h) {
            assert_eq!(self.rank(Some(h)), 0, "leaf {h:?} has a non-zero rank");
        }
    }
}

impl<K: Ord, V> OrderedIndex<K, V> for WavlTree<K, V> {
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
        let node = self.tree.attach(parent, side, key, value, Rank(0));
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
        self.fix_remove(detached.parent, detached.side);
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
        self.check_ranks(self.tree.root());
    }
}

impl<K: Ord, V> OrderStatistic<K, V> for WavlTree<K, V> {
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

impl<K, V> Default for WavlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for WavlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tree.entries()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for WavlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for WavlTree<K, V> {
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
