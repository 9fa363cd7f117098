//! Runtime choice of balancing strategy.

use core::borrow::Borrow;
use core::iter::FusedIterator;

use crate::avl::{self, AvlTree};
use crate::bplus_tree::{self, BPlusTree};
use crate::btree::{self, BTree};
use crate::config::{IndexConfig, Variant};
use crate::error::ConfigError;
use crate::index::OrderedIndex;
use crate::red_black::{self, RedBlackTree};
use crate::treap::{self, Treap};
use crate::wavl::{self, WavlTree};

/// One of the six ordered indexes, picked when it is built.
///
/// Every operation forwards to the wrapped index, so code written against
/// [`OrderedIndex`] can switch strategies through configuration alone.
///
/// # Examples
///
/// ```
/// use ordered_index::{AnyIndex, OrderedIndex, Variant};
///
/// for variant in Variant::ALL {
///     let mut index = AnyIndex::new(variant);
///     for key in [50, 30, 70, 20, 40, 60, 80] {
///         index.insert(key, ());
///     }
///     assert!(index.contains_key(&40));
///     assert!(!index.contains_key(&90));
/// }
/// ```
#[derive(Clone, Debug)]
pub enum AnyIndex<K, V> {
    Avl(AvlTree<K, V>),
    RedBlack(RedBlackTree<K, V>),
    Wavl(WavlTree<K, V>),
    Treap(Treap<K, V>),
    BTree(BTree<K, V>),
    BPlusTree(BPlusTree<K, V>),
}

/// Range iterator of an [`AnyIndex`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub enum AnyRange<'a, K, V> {
    Avl(avl::Range<'a, K, V>),
    RedBlack(red_black::Range<'a, K, V>),
    Wavl(wavl::Range<'a, K, V>),
    Treap(treap::Range<'a, K, V>),
    BTree(btree::Range<'a, K, V>),
    BPlusTree(bplus_tree::Range<'a, K, V>),
}

macro_rules! dispatch {
    ($index:expr, $inner:ident => $body:expr) => {
        match $index {
            AnyIndex::Avl($inner) => $body,
            AnyIndex::RedBlack($inner) => $body,
            AnyIndex::Wavl($inner) => $body,
            AnyIndex::Treap($inner) => $body,
            AnyIndex::BTree($inner) => $body,
            AnyIndex::BPlusTree($inner) => $body,
        }
    };
}

macro_rules! dispatch_range {
    ($index:expr, $inner:ident => $body:expr) => {
        match $index {
            AnyIndex::Avl($inner) => AnyRange::Avl($body),
            AnyIndex::RedBlack($inner) => AnyRange::RedBlack($body),
            AnyIndex::Wavl($inner) => AnyRange::Wavl($body),
            AnyIndex::Treap($inner) => AnyRange::Treap($body),
            AnyIndex::BTree($inner) => AnyRange::BTree($body),
            AnyIndex::BPlusTree($inner) => AnyRange::BPlusTree($body),
        }
    };
}

impl<K, V> AnyIndex<K, V> {
    /// Builds an empty index of `variant` with default settings.
    #[must_use]
    pub fn new(variant: Variant) -> Self {
        match variant {
            Variant::Avl => AnyIndex::Avl(AvlTree::new()),
            Variant::RedBlack => AnyIndex::RedBlack(RedBlackTree::new()),
            Variant::Wavl => AnyIndex::Wavl(WavlTree::new()),
            Variant::Treap => AnyIndex::Treap(Treap::new()),
            Variant::BTree => AnyIndex::BTree(BTree::new()),
            Variant::BPlusTree => AnyIndex::BPlusTree(BPlusTree::new()),
        }
    }

    /// Builds an empty index as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns the error of [`IndexConfig::validate`].
    pub fn with_config(config: &IndexConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let index = match config.variant {
            Variant::Treap => AnyIndex::Treap(Treap::with_seed(config.treap_seed)),
            Variant::BTree => AnyIndex::BTree(BTree::with_min_degree(config.min_degree)?),
            Variant::BPlusTree => AnyIndex::BPlusTree(BPlusTree::with_min_degree(config.min_degree)?),
            variant => Self::new(variant),
        };
        let min_degree = config.variant.is_multiway().then_some(config.min_degree);
        tracing::debug!(variant = %config.variant, ?min_degree, "built index");
        Ok(index)
    }

    /// The strategy this index was built with.
    #[must_use]
    pub fn variant(&self) -> Variant {
        match self {
            AnyIndex::Avl(_) => Variant::Avl,
            AnyIndex::RedBlack(_) => Variant::RedBlack,
            AnyIndex::Wavl(_) => Variant::Wavl,
            AnyIndex::Treap(_) => Variant::Treap,
            AnyIndex::BTree(_) => Variant::BTree,
            AnyIndex::BPlusTree(_) => Variant::BPlusTree,
        }
    }
}

impl<K: Ord + Clone, V> OrderedIndex<K, V> for AnyIndex<K, V> {
    type Range<'a>
        = AnyRange<'a, K, V>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn len(&self) -> usize {
        dispatch!(self, index => index.len())
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        dispatch!(self, index => index.insert(key, value))
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        dispatch!(self, index => index.get(key))
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        dispatch!(self, index => index.get_mut(key))
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        dispatch!(self, index => index.remove(key))
    }

    fn range<Q>(&self, low: &Q, high: &Q) -> AnyRange<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        dispatch_range!(self, index => index.range(low, high))
    }

    fn iter(&self) -> AnyRange<'_, K, V> {
        dispatch_range!(self, index => index.iter())
    }

    fn last_key_value(&self) -> Option<(&K, &V)> {
        dispatch!(self, index => index.last_key_value())
    }

    fn clear(&mut self) {
        dispatch!(self, index => index.clear());
    }

    fn validate(&self) {
        dispatch!(self, index => index.validate());
    }
}

impl<K, V> Default for AnyIndex<K, V> {
    fn default() -> Self {
        Self::new(Variant::default())
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for AnyIndex<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for AnyIndex<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = Self::default();
        index.extend(iter);
        index
    }
}

impl<'a, K, V> Iterator for AnyRange<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            AnyRange::Avl(range) => range.next(),
            AnyRange::RedBlack(range) => range.next(),
            AnyRange::Wavl(range) => range.next(),
            AnyRange::Treap(range) => range.next(),
            AnyRange::BTree(range) => range.next(),
            AnyRange::BPlusTree(range) => range.next(),
        }
    }
}

impl<K, V> FusedIterator for AnyRange<'_, K, V> {}

impl<K, V> Clone for AnyRange<'_, K, V> {
    fn clone(&self) -> Self {
        match self {
            AnyRange::Avl(range) => AnyRange::Avl(range.clone()),
            AnyRange::RedBlack(range) => AnyRange::RedBlack(range.clone()),
            AnyRange::Wavl(range) => AnyRange::Wavl(range.clone()),
            AnyRange::Treap(range) => AnyRange::Treap(range.clone()),
            AnyRange::BTree(range) => AnyRange::BTree(range.clone()),
            AnyRange::BPlusTree(range) => AnyRange::BPlusTree(range.clone()),
        }
    }
}
