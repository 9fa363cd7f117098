//! Self-balancing ordered indexes for Rust.
//!
//! Six balancing strategies share one capability set, the [`OrderedIndex`] trait:
//!
//! - [`AvlTree`] - height-balanced binary search tree
//! - [`RedBlackTree`] - color-balanced binary search tree
//! - [`WavlTree`] - rank-balanced (weak AVL) binary search tree
//! - [`Treap`] - binary search tree heap-ordered on random priorities
//! - [`BTree`] - multiway tree with entries in every node
//! - [`BPlusTree`] - multiway tree with entries in linked leaves
//!
//! [`AnyIndex`] picks one at runtime from an [`IndexConfig`]. The binary variants also track
//! subtree sizes and answer [`OrderStatistic`] queries.
//!
//! # Example
//!
//! ```
//! use ordered_index::{AnyIndex, IndexConfig, OrderedIndex, Variant};
//!
//! let config: IndexConfig = "wavl".parse::<Variant>().map(|v| IndexConfig::default().with_variant(v))?;
//! let mut index = AnyIndex::with_config(&config)?;
//! for key in [50, 30, 70, 20, 40, 60, 80] {
//!     index.insert(key, key * 10);
//! }
//!
//! // A duplicate key is a no-op.
//! assert!(!index.insert(40, 0));
//! assert_eq!(index.get(&40), Some(&400));
//! assert_eq!(index.get(&90), None);
//!
//! let in_range: Vec<_> = index.range(&25, &65).map(|(k, _)| *k).collect();
//! assert_eq!(in_range, [30, 40, 50, 60]);
//! # Ok::<(), ordered_index::ConfigError>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **No `unsafe`** - Nodes live in an arena and link to each other by handle
//! - **Checked invariants** - [`OrderedIndex::validate`] audits ordering, balance and links

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod config;
mod error;
mod index;
mod order_statistic;
mod priority;
mod raw;

pub mod any_index;
pub mod avl;
pub mod bplus_tree;
pub mod btree;
pub mod red_black;
pub mod treap;
pub mod wavl;

pub use any_index::{AnyIndex, AnyRange};
pub use avl::AvlTree;
pub use bplus_tree::BPlusTree;
pub use btree::BTree;
pub use config::{IndexConfig, Variant};
pub use error::ConfigError;
pub use index::OrderedIndex;
pub use order_statistic::OrderStatistic;
pub use priority::{DEFAULT_TREAP_SEED, PrioritySource, SeededPriorities};
pub use red_black::RedBlackTree;
pub use treap::Treap;
pub use wavl::WavlTree;
