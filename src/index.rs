use core::borrow::Borrow;
use core::iter::FusedIterator;

/// The capability set shared by every balancing strategy in this crate.
///
/// Keys are ordered by their [`Ord`] implementation; the index never defines an order of
/// its own. Each key is stored at most once.
///
/// Expected outcomes are plain values: a missing key is `None`, a duplicate insert returns
/// `false`, an empty or inverted range yields nothing. Broken structural invariants are bugs
/// and panic.
///
/// # Examples
///
/// ```
/// use ordered_index::{BPlusTree, OrderedIndex};
///
/// let mut index = BPlusTree::with_min_degree(3).unwrap();
/// for key in [3, 7, 1, 5, 11, 17, 13, 2, 19, 23] {
///     index.insert(key, key * 100);
/// }
///
/// let hits: Vec<_> = index.range(&5, &15).map(|(k, _)| *k).collect();
/// assert_eq!(hits, [5, 7, 11, 13]);
/// assert_eq!(index.get(&90), None);
/// ```
pub trait OrderedIndex<K, V> {
    /// Lazy ascending iterator returned by [`range`](Self::range) and [`iter`](Self::iter).
    type Range<'a>: Iterator<Item = (&'a K, &'a V)> + FusedIterator
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    /// Returns the number of stored entries.
    fn len(&self) -> usize;

    /// Returns `true` if the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `key` with `value` and rebalances.
    ///
    /// Returns `false` and leaves the index untouched (the stored value included) if
    /// `key` is already present.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Returns the value stored under `key`.
    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;

    /// Returns a mutable reference to the value stored under `key`.
    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;

    /// Returns `true` if `key` is stored.
    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).is_some()
    }

    /// Removes `key` and rebalances, returning its value. A missing key is a no-op.
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;

    /// Returns the entries with `low <= key <= high` in ascending order.
    ///
    /// Every call builds a fresh iterator. If `low > high` the iterator is empty.
    fn range<Q>(&self, low: &Q, high: &Q) -> Self::Range<'_>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;

    /// Returns every entry in ascending order.
    fn iter(&self) -> Self::Range<'_>;

    /// Returns the entry with the smallest key.
    fn first_key_value(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Returns the entry with the largest key.
    fn last_key_value(&self) -> Option<(&K, &V)>;

    /// Removes every entry.
    fn clear(&mut self);

    /// Checks ordering, balance and (where applicable) leaf-chain invariants.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violated invariant.
    fn validate(&self);
}
