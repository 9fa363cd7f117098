mod arena;
mod binary;
mod handle;
mod node;

pub(crate) use arena::Arena;
pub(crate) use binary::{Augment, BinaryTree, Entries, Lookup, Side};
pub(crate) use handle::Handle;
pub(crate) use node::{DEFAULT_MIN_DEGREE, InternalNode, Node, SearchResult, max_keys, min_keys};
