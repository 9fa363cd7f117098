//! Height-balanced binary search tree.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::index::OrderedIndex;
use crate::order_statistic::OrderStatistic;
use crate::raw::{Augment, BinaryTree, Entries, Handle, Lookup, Side};

/// Subtree height; a leaf has height 1.
#[derive(Clone, Copy, Debug)]
struct Height(u8);

impl Augment for Height {
    fn refresh(&mut self, left: Option<Self>, right: Option<Self>) {
        self.0 = 1 + left.map_or(0, |h| h.0).max(right.map_or(0, |h| h.0));
    }
}

/// An ordered index kept as an AVL tree.
///
/// For every node the heights of its two subtrees differ by at most one. Insertions walk
/// back up the parent links and stop at the first node whose height did not change or
/// after the first rotation; removals keep walking while heights keep shrinking.
///
/// # Examples
///
/// ```
/// use ordered_index::{AvlTree, OrderedIndex};
///
/// let mut tree = AvlTree::new();
/// for key in [10, 20, 30, 40, 50, 25] {
///     tree.insert(key, ());
/// }
/// let keys: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
/// assert_eq!(keys, [10, 20, 25, 30, 40, 50]);
/// ```
#[derive(Clone)]
pub struct AvlTree<K, V> {
    tree: BinaryTree<K, V, Height>,
}

/// Ascending iterator over a key range of an [`AvlTree`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    inner: Entries<'a, K, V, Height>,
}

impl<K, V> AvlTree<K, V> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { tree: BinaryTree::new() }
    }

    fn height(&self, handle: Option<Handle>) -> i32 {
        handle.map_or(0, |h| i32::from(self.tree.meta(h).0))
    }

    /// Height of the left subtree minus height of the right subtree.
    fn balance_factor(&self, handle: Handle) -> i32 {
        self.height(self.tree.child(handle, Side::Left)) - self.height(self.tree.child(handle, Side::Right))
    }

    /// Rotates at `handle` if it is out of balance and returns the subtree's root.
    fn restore(&mut self, handle: Handle) -> Handle {
        let factor = self.balance_factor(handle);
        if factor > 1 {
            let left = self.tree.child(handle, Side::Left).expect("left-heavy node without left child");
            if self.balance_factor(left) < 0 {
                self.tree.rotate(left, Side::Left);
            }
            self.tree.rotate(handle, Side::Right)
        } else if factor < -1 {
            let right = self.tree.child(handle, Side::Right).expect("right-heavy node without right child");
            if self.balance_factor(right) > 0 {
                self.tree.rotate(right, Side::Right);
            }
            self.tree.rotate(handle, Side::Left)
        } else {
            handle
        }
    }

    /// Recomputes heights from `start` toward the root, rotating where needed, until a
    /// subtree ends up with the same height it had before the mutation.
    fn rebalance_from(&mut self, start: Option<Handle>) {
        let mut current = start;
        while let Some(handle) = current {
            let before = self.tree.meta(handle).0;
            self.tree.refresh(handle);
            let top = self.restore(handle);
            if self.tree.meta(top).0 == before {
                break;
            }
            current = self.tree.parent(top);
        }
    }

    /// Recursively checks heights and balance factors, returning the subtree height.
    fn check_balance(&self, handle: Option<Handle>) -> i32 {
        let Some(h) = handle else {
            return 0;
        };
        let left = self.check_balance(self.tree.child(h, Side::Left));
        let right = self.check_balance(self.tree.child(h, Side::Right));
        assert!((left - right).abs() <= 1, "AVL balance violated at {h:?}: {left} vs {right}");
        let height = 1 + left.max(right);
        assert_eq!(self.height(Some(h)), height, "stale height stored at {h:?}");
        height
    }
}

impl<K: Ord, V> OrderedIndex<K, V> for AvlTree<K, V> {
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
        self.tree.attach(parent, side, key, value, Height(1));
        self.rebalance_from(parent);
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
        self.rebalance_from(detached.parent);
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
        self.check_balance(self.tree.root());
    }
}

impl<K: Ord, V> OrderStatistic<K, V> for AvlTree<K, V> {
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

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tree.entries()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
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
