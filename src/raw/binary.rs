use core::borrow::Borrow;
use core::cmp::Ordering;
use core::iter::FusedIterator;
use core::mem;

use super::arena::Arena;
use super::handle::Handle;

/// Which child slot of a binary node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Per-variant balance metadata stored in every binary node.
///
/// `refresh` recomputes fields that are a pure function of the children (AVL height).
/// Fields the balancer maintains explicitly (color, rank, priority) keep the default no-op.
pub(crate) trait Augment: Copy {
    fn refresh(&mut self, _left: Option<Self>, _right: Option<Self>) {}
}

pub(crate) struct BinaryNode<K, V, M> {
    key: K,
    value: V,
    // Non-owning back-reference, used only to walk upward.
    parent: Option<Handle>,
    children: [Option<Handle>; 2],
    // Number of entries in the subtree rooted here.
    size: usize,
    meta: M,
}

/// Outcome of descending toward a key.
pub(crate) enum Lookup {
    Found(Handle),
    /// The key is absent; a new node would hang off `parent` on `side` (`None` = empty tree).
    Vacant { parent: Option<Handle>, side: Side },
}

/// A node unlinked by [`BinaryTree::detach`], with the position it used to occupy.
pub(crate) struct Detached<K, V, M> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) meta: M,
    pub(crate) parent: Option<Handle>,
    pub(crate) side: Side,
    /// The former only child, now in the detached node's place.
    pub(crate) replacement: Option<Handle>,
}

/// Parent-linked binary search tree shared by the rotation-based variants.
///
/// Owns the node arena and the root, keeps subtree sizes exact across attach, detach and
/// rotation, and leaves every balance decision to the variant wrapping it.
#[derive(Clone)]
pub(crate) struct BinaryTree<K, V, M> {
    nodes: Arena<BinaryNode<K, V, M>>,
    root: Option<Handle>,
}

impl<K: Clone, V: Clone, M: Clone> Clone for BinaryNode<K, V, M> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            parent: self.parent,
            children: self.children,
            size: self.size,
            meta: self.meta.clone(),
        }
    }
}

impl<K, V, M: Augment> BinaryTree<K, V, M> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.size_of(self.root)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) fn key(&self, handle: Handle) -> &K {
        &self.nodes.get(handle).key
    }

    #[inline]
    pub(crate) fn value(&self, handle: Handle) -> &V {
        &self.nodes.get(handle).value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        &mut self.nodes.get_mut(handle).value
    }

    #[inline]
    pub(crate) fn entry(&self, handle: Handle) -> (&K, &V) {
        let node = self.nodes.get(handle);
        (&node.key, &node.value)
    }

    #[inline]
    pub(crate) fn meta(&self, handle: Handle) -> M {
        self.nodes.get(handle).meta
    }

    /// Metadata of a possibly-absent child.
    #[inline]
    pub(crate) fn meta_of(&self, handle: Option<Handle>) -> Option<M> {
        handle.map(|h| self.meta(h))
    }

    #[inline]
    pub(crate) fn set_meta(&mut self, handle: Handle, meta: M) {
        self.nodes.get_mut(handle).meta = meta;
    }

    #[inline]
    pub(crate) fn child(&self, handle: Handle, side: Side) -> Option<Handle> {
        self.nodes.get(handle).children[side.index()]
    }

    #[inline]
    pub(crate) fn parent(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).parent
    }

    #[inline]
    pub(crate) fn size_of(&self, handle: Option<Handle>) -> usize {
        handle.map_or(0, |h| self.nodes.get(h).size)
    }

    /// Which child slot of its parent `handle` occupies; `None` for the root.
    pub(crate) fn side_of(&self, handle: Handle) -> Option<Side> {
        let parent = self.parent(handle)?;
        if self.child(parent, Side::Left) == Some(handle) {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }

    pub(crate) fn is_leaf(&self, handle: Handle) -> bool {
        let node = self.nodes.get(handle);
        node.children[0].is_none() && node.children[1].is_none()
    }

    /// Points `parent`'s `side` slot (or the root when `parent` is `None`) at `child`,
    /// updating the child's back-reference.
    fn link(&mut self, parent: Option<Handle>, side: Side, child: Option<Handle>) {
        match parent {
            Some(p) => self.nodes.get_mut(p).children[side.index()] = child,
            None => self.root = child,
        }
        if let Some(c) = child {
            self.nodes.get_mut(c).parent = parent;
        }
    }

    /// Recomputes the size and derived metadata of `handle` from its children.
    pub(crate) fn refresh(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let [left, right] = node.children;
        let size = 1 + self.size_of(left) + self.size_of(right);
        let (left_meta, right_meta) = (self.meta_of(left), self.meta_of(right));
        let node = self.nodes.get_mut(handle);
        node.size = size;
        node.meta.refresh(left_meta, right_meta);
    }

    /// Rotates `handle` down toward `side`; its child on the opposite side takes its place.
    /// Returns the new subtree root.
    ///
    /// # Panics
    ///
    /// Panics if `handle` has no child on the opposite side.
    pub(crate) fn rotate(&mut self, handle: Handle, side: Side) -> Handle {
        let riser = self
            .child(handle, side.opposite())
            .expect("`BinaryTree::rotate()` - no child to rotate up!");
        let inner = self.child(riser, side);
        let parent = self.parent(handle);
        let parent_side = self.side_of(handle).unwrap_or(Side::Left);

        self.link(Some(handle), side.opposite(), inner);
        self.link(Some(riser), side, Some(handle));
        self.link(parent, parent_side, Some(riser));

        self.refresh(handle);
        self.refresh(riser);

        tracing::trace!(pivot = ?handle, riser = ?riser, direction = ?side, "rotate");
        riser
    }

    /// Rotates `handle` above its parent.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is the root.
    pub(crate) fn rotate_up(&mut self, handle: Handle) -> Handle {
        let parent = self.parent(handle).expect("`BinaryTree::rotate_up()` - `handle` is the root!");
        let side = self.side_of(handle).unwrap_or(Side::Left);
        self.rotate(parent, side.opposite())
    }

    /// Hangs a new node off `parent` on `side` (or makes it the root) and bumps the sizes
    /// of every ancestor. Balance metadata is left to the caller.
    pub(crate) fn attach(&mut self, parent: Option<Handle>, side: Side, key: K, value: V, meta: M) -> Handle {
        let handle = self.nodes.insert(BinaryNode {
            key,
            value,
            parent: None,
            children: [None, None],
            size: 1,
            meta,
        });
        self.link(parent, side, Some(handle));

        let mut ancestor = parent;
        while let Some(a) = ancestor {
            let node = self.nodes.get_mut(a);
            node.size += 1;
            ancestor = node.parent;
        }
        handle
    }

    /// Exchanges the key/value payloads of two nodes, leaving structure and metadata in place.
    pub(crate) fn swap_payload(&mut self, a: Handle, b: Handle) {
        let (a, b) = self.nodes.pair_mut(a, b);
        mem::swap(&mut a.key, &mut b.key);
        mem::swap(&mut a.value, &mut b.value);
    }

    /// Unlinks a node with at most one child, splicing that child into its place and
    /// shrinking every ancestor's size.
    ///
    /// # Panics
    ///
    /// Panics if `handle` has two children.
    pub(crate) fn detach(&mut self, handle: Handle) -> Detached<K, V, M> {
        let [left, right] = self.nodes.get(handle).children;
        assert!(
            left.is_none() || right.is_none(),
            "`BinaryTree::detach()` - node has two children!"
        );
        let replacement = left.or(right);
        let parent = self.parent(handle);
        let side = self.side_of(handle).unwrap_or(Side::Left);
        self.link(parent, side, replacement);

        let mut ancestor = parent;
        while let Some(a) = ancestor {
            let node = self.nodes.get_mut(a);
            node.size -= 1;
            ancestor = node.parent;
        }

        let node = self.nodes.remove(handle);
        Detached {
            key: node.key,
            value: node.value,
            meta: node.meta,
            parent,
            side,
            replacement,
        }
    }

    /// Extreme node of the subtree at `handle` on `side` (leftmost for `Left`).
    pub(crate) fn extreme(&self, mut handle: Handle, side: Side) -> Handle {
        while let Some(child) = self.child(handle, side) {
            handle = child;
        }
        handle
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|r| self.extreme(r, Side::Left))
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|r| self.extreme(r, Side::Right))
    }

    /// In-order neighbour of `handle` toward `side` (`Right` = successor).
    pub(crate) fn step(&self, handle: Handle, side: Side) -> Option<Handle> {
        if let Some(child) = self.child(handle, side) {
            return Some(self.extreme(child, side.opposite()));
        }
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            if self.child(parent, side.opposite()) == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Node at zero-based in-order position `rank`.
    pub(crate) fn select(&self, mut rank: usize) -> Option<Handle> {
        let mut current = self.root?;
        if rank >= self.size_of(Some(current)) {
            return None;
        }
        loop {
            let left = self.child(current, Side::Left);
            let left_size = self.size_of(left);
            match rank.cmp(&left_size) {
                Ordering::Less => current = left?,
                Ordering::Equal => return Some(current),
                Ordering::Greater => {
                    rank -= left_size + 1;
                    current = self.child(current, Side::Right)?;
                }
            }
        }
    }

    pub(crate) fn entries(&self) -> Entries<'_, K, V, M> {
        Entries {
            tree: self,
            front: self.first(),
            end: None,
        }
    }
}

impl<K: Ord, V, M: Augment> BinaryTree<K, V, M> {
    pub(crate) fn lookup<Q>(&self, key: &Q) -> Lookup
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(h) = current {
            side = match key.cmp(self.key(h).borrow()) {
                Ordering::Equal => return Lookup::Found(h),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            parent = Some(h);
            current = self.child(h, side);
        }
        Lookup::Vacant { parent, side }
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.lookup(key) {
            Lookup::Found(h) => Some(h),
            Lookup::Vacant { .. } => None,
        }
    }

    /// First node whose key is `>= key` (or `> key` when `strict`).
    fn bound<Q>(&self, key: &Q, strict: bool) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(h) = current {
            let ordering = self.key(h).borrow().cmp(key);
            if ordering == Ordering::Greater || (!strict && ordering == Ordering::Equal) {
                candidate = Some(h);
                current = self.child(h, Side::Left);
            } else {
                current = self.child(h, Side::Right);
            }
        }
        candidate
    }

    pub(crate) fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut rank = 0;
        let mut current = self.root;
        while let Some(h) = current {
            match key.cmp(self.key(h).borrow()) {
                Ordering::Less => current = self.child(h, Side::Left),
                Ordering::Equal => return Some(rank + self.size_of(self.child(h, Side::Left))),
                Ordering::Greater => {
                    rank += self.size_of(self.child(h, Side::Left)) + 1;
                    current = self.child(h, Side::Right);
                }
            }
        }
        None
    }

    /// Entries with `low <= key <= high`, ascending. Empty when `low > high`.
    pub(crate) fn range<Q>(&self, low: &Q, high: &Q) -> Entries<'_, K, V, M>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if low > high {
            return Entries {
                tree: self,
                front: None,
                end: None,
            };
        }
        Entries {
            tree: self,
            front: self.bound(low, false),
            end: self.bound(high, true),
        }
    }

    /// Checks ordering, parent links and subtree sizes.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first broken invariant.
    pub(crate) fn check_structure(&self) {
        let Some(root) = self.root else {
            assert!(self.nodes.is_empty(), "empty tree still holds {} nodes", self.nodes.len());
            return;
        };
        assert!(self.parent(root).is_none(), "root {root:?} has a parent");

        let counted = self.check_subtree(root, None, None);
        assert_eq!(counted, self.nodes.len(), "reachable nodes differ from allocated nodes");
    }

    fn check_subtree(&self, handle: Handle, low: Option<&K>, high: Option<&K>) -> usize {
        let key = self.key(handle);
        if let Some(low) = low {
            assert!(low < key, "ordering violated: node {handle:?} is not above its lower bound");
        }
        if let Some(high) = high {
            assert!(key < high, "ordering violated: node {handle:?} is not below its upper bound");
        }

        let mut size = 1;
        for (side, low, high) in [(Side::Left, low, Some(key)), (Side::Right, Some(key), high)] {
            if let Some(child) = self.child(handle, side) {
                assert_eq!(self.parent(child), Some(handle), "child {child:?} has a stale parent link");
                size += self.check_subtree(child, low, high);
            }
        }
        assert_eq!(self.size_of(Some(handle)), size, "stored size of {handle:?} is wrong");
        size
    }
}

/// Ascending walk over a contiguous run of nodes, following successor links.
pub(crate) struct Entries<'a, K, V, M> {
    tree: &'a BinaryTree<K, V, M>,
    front: Option<Handle>,
    // First node past the run (exclusive); `None` runs to the end of the tree.
    end: Option<Handle>,
}

impl<K, V, M> Clone for Entries<'_, K, V, M> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            end: self.end,
        }
    }
}

impl<'a, K, V, M: Augment> Iterator for Entries<'a, K, V, M> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.front.filter(|&h| Some(h) != self.end)?;
        self.front = self.tree.step(current, Side::Right);
        Some(self.tree.entry(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.front {
            Some(h) if Some(h) != self.end => (1, Some(self.tree.len())),
            _ => (0, Some(0)),
        }
    }
}

impl<K, V, M: Augment> FusedIterator for Entries<'_, K, V, M> {}
