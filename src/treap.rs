//! Randomized search tree.

use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::index::OrderedIndex;
use crate::order_statistic::OrderStatistic;
use crate::priority::{PrioritySource, SeededPriorities};
use crate::raw::{Augment, BinaryTree, Entries, Handle, Lookup, Side};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Priority(f64);

impl Augment for Priority {}

/// An ordered index kept as a treap: a binary search tree on keys that is simultaneously a
/// max-heap on per-node random priorities.
///
/// The expected depth is logarithmic whatever the insertion order. Priorities come from a
/// [`PrioritySource`]; the default source is a seeded generator, so a given sequence of
/// operations always builds the same tree.
///
/// # Examples
///
/// ```
/// use ordered_index::{OrderedIndex, Treap};
///
/// let mut treap = Treap::with_seed(42);
/// for key in 0..100 {
///     treap.insert(key, key * 2);
/// }
/// assert_eq!(treap.range(&10, &12).map(|(_, v)| *v).collect::<Vec<_>>(), [20, 22, 24]);
/// ```
#[derive(Clone)]
pub struct Treap<K, V, P = SeededPriorities> {
    tree: BinaryTree<K, V, Priority>,
    priorities: P,
}

/// Ascending iterator over a key range of a [`Treap`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    inner: Entries<'a, K, V, Priority>,
}

impl<K, V> Treap<K, V> {
    /// Creates an empty treap drawing priorities from the default seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_priorities(SeededPriorities::default())
    }

    /// Creates an empty treap whose priorities are determined by `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_priorities(SeededPriorities::new(seed))
    }
}

impl<K, V, P> Treap<K, V, P> {
    /// Creates an empty treap drawing priorities from `priorities`.
    #[must_use]
    pub const fn with_priorities(priorities: P) -> Self {
        Self {
            tree: BinaryTree::new(),
            priorities,
        }
    }

    fn priority(&self, handle: Option<Handle>) -> Option<f64> {
        self.tree.meta_of(handle).map(|p| p.0)
    }

    fn check_heap(&self, handle: Option<Handle>) {
        let Some(h) = handle else {
            return;
        };
        let priority = self.tree.meta(h).0;
        for side in [Side::Left, Side::Right] {
            let child = self.tree.child(h, side);
            if let Some(child_priority) = self.priority(child) {
                assert!(
                    child_priority <= priority,
                    "heap order violated below {h:?}: {child_priority} > {priority}"
                );
            }
            self.check_heap(child);
        }
    }
}

impl<K: Ord, V, P: PrioritySource> OrderedIndex<K, V> for Treap<K, V, P> {
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
        let priority = Priority(self.priorities.next_priority());
        debug_assert!(
            (0.0..1.0).contains(&priority.0),
            "`Treap::insert()` - priority {} is outside [0, 1)!",
            priority.0
        );
        let node = self.tree.attach(parent, side, key, value, priority);
        while let Some(parent) = self.tree.parent(node) {
            if self.tree.meta(parent).0 >= priority.0 {
                break;
            }
            self.tree.rotate_up(node);
        }
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
        let node = self.tree.find(key)?;
        // Sink the node below its higher-priority child until it has at most one child.
        while let (Some(left), Some(right)) = (self.tree.child(node, Side::Left), self.tree.child(node, Side::Right)) {
            let riser = if self.tree.meta(left).0 > self.tree.meta(right).0 {
                left
            } else {
                right
            };
            self.tree.rotate_up(riser);
        }
        Some(self.tree.detach(node).value)
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
        self.check_heap(self.tree.root());
    }
}

impl<K: Ord, V, P: PrioritySource> OrderStatistic<K, V> for Treap<K, V, P> {
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

impl<K, V, P: Default> Default for Treap<K, V, P> {
    fn default() -> Self {
        Self::with_priorities(P::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P> fmt::Debug for Treap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tree.entries()).finish()
    }
}

impl<K: Ord, V, P: PrioritySource> Extend<(K, V)> for Treap<K, V, P> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V, P: PrioritySource + Default> FromIterator<(K, V)> for Treap<K, V, P> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut treap = Self::default();
        treap.extend(iter);
        treap
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
