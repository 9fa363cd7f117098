use core::borrow::Borrow;

/// Rank queries over an index that tracks subtree sizes.
///
/// Ranks are zero-based positions in ascending key order. Implemented by the
/// rotation-based variants, whose nodes carry subtree sizes maintained through every
/// attach, detach and rotation.
///
/// # Examples
///
/// ```
/// use ordered_index::{AvlTree, OrderStatistic, OrderedIndex};
///
/// let mut tree = AvlTree::new();
/// for key in [10, 20, 30, 40, 50, 25] {
///     tree.insert(key, ());
/// }
///
/// // The third-smallest key.
/// assert_eq!(tree.get_by_rank(2).map(|(k, _)| *k), Some(25));
/// assert_eq!(tree.rank_of(&40), Some(4));
/// ```
pub trait OrderStatistic<K, V> {
    /// Returns the entry at position `rank`, or `None` if `rank >= len()`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    fn get_by_rank(&self, rank: usize) -> Option<(&K, &V)>;

    /// Returns the position of `key`, or `None` if it is not stored.
    ///
    /// # Complexity
    ///
    /// O(log n)
    fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord;
}
