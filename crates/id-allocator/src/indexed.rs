//! Tree-over-bitmap ID allocator.
//!
//! This module provides an allocator that finds a free ID in O(log n) by
//! keeping a complete binary tree of "subtree is full" bits on top of the
//! per-ID bitmap.
//!
//! # Layout
//!
//! For a capacity of `n` the tree is a flat bit vector of `2n - 1` nodes in
//! level order. Node `i` has children `2i + 1` and `2i + 2` and parent
//! `(i - 1) / 2`. Nodes `n - 1 ..= 2n - 2` are the leaves, and leaf
//! `n - 1 + id` holds the state of ID `id`:
//!
//! ```text
//! n = 4:                 0
//!                   ┌────┴────┐
//!                   1         2
//!                 ┌─┴─┐     ┌─┴─┐
//!                 3   4     5   6
//!           id:   0   1     2   3
//! ```
//!
//! A leaf bit is set while its ID is allocated. An internal bit is the AND of
//! its two children, so it is set exactly when every leaf below it is
//! allocated.
//!
//! # Algorithm
//!
//! - **Allocation**: If the root is set every ID is in use. Otherwise walk
//!   down from the root, always taking the left child unless it is full. The
//!   AND invariant guarantees that the right child has a free leaf whenever
//!   the left one does not.
//! - **Release**: Clear the leaf of the ID.
//! - **Propagation**: After a leaf changes, recompute the AND of each
//!   ancestor, stopping at the first ancestor whose bit does not change.
//!
//! When `n` is not a power of two the leaves sit on two levels, and the
//! left-first walk visits them in tree order rather than in ID order. For
//! `n = 3` a fresh allocator hands out `1, 2, 0`.
//!
//! # Performance Characteristics
//!
//! - **Allocation**: O(log n)
//! - **Release**: O(log n)
//! - **Check**: O(1)
//! - **Memory**: `2n - 1` bits

use bitvec::vec::BitVec;

use crate::{Capacity, IdAllocator};

const ROOT: usize = 0;

const fn left_child(node: usize) -> usize {
    2 * node + 1
}

const fn parent(node: usize) -> usize {
    (node - 1) / 2
}

/// An ID allocator with O(log n) allocate and release.
///
/// # Examples
///
/// ```
/// use id_allocator::{Capacity, IdAllocator as _, indexed::IndexedIdAllocator};
///
/// let mut allocator = IndexedIdAllocator::new(Capacity::new(4)?);
/// let ids: Vec<_> = (0..4).map(|_| allocator.allocate().unwrap()).collect();
/// assert_eq!(ids, [0, 1, 2, 3]);
/// assert_eq!(allocator.allocate(), None);
///
/// allocator.release(2);
/// assert_eq!(allocator.allocate(), Some(2));
/// # Ok::<(), id_allocator::CapacityError>(())
/// ```
#[derive(Debug, Clone)]
pub struct IndexedIdAllocator {
    capacity: Capacity,
    tree: BitVec,
    allocated: usize,
}

impl IndexedIdAllocator {
    /// Creates an allocator with every ID in `0..capacity` free.
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        log::debug!("creating indexed id allocator, capacity={capacity}");
        // `Capacity::MAX` keeps `2n` from overflowing.
        let nodes = (2 * capacity.get()).saturating_sub(1);
        Self {
            capacity,
            tree: BitVec::repeat(false, nodes),
            allocated: 0,
        }
    }

    fn first_leaf(&self) -> usize {
        self.capacity.get() - 1
    }

    fn leaf(&self, id: usize) -> Option<usize> {
        self.capacity
            .contains(id)
            .then(|| self.first_leaf() + id)
    }

    /// Recomputes the ancestors of `node` after its bit changed.
    fn propagate(&mut self, mut node: usize) {
        while node != ROOT {
            let parent = parent(node);
            let left = left_child(parent);
            let full = self.tree[left] && self.tree[left + 1];
            if self.tree[parent] == full {
                break;
            }
            self.tree.set(parent, full);
            node = parent;
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_tree_consistent(&self) {
        for node in 0..self.tree.len().saturating_sub(self.capacity.get()) {
            let left = left_child(node);
            assert_eq!(
                self.tree[node],
                self.tree[left] && self.tree[left + 1],
                "node {node} disagrees with its children"
            );
        }
        let leaves = self.tree.len() - self.capacity.get();
        assert_eq!(self.tree[leaves..].count_ones(), self.allocated);
    }
}

impl IdAllocator for IndexedIdAllocator {
    fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn len(&self) -> usize {
        self.allocated
    }

    fn allocate(&mut self) -> Option<usize> {
        if self.tree.is_empty() || self.tree[ROOT] {
            log::debug!("indexed: all {} ids are in use", self.capacity);
            return None;
        }

        let first_leaf = self.first_leaf();
        let mut node = ROOT;
        while node < first_leaf {
            let left = left_child(node);
            node = if self.tree[left] { left + 1 } else { left };
            debug_assert!(!self.tree[node], "free subtree without a free child");
        }

        self.tree.set(node, true);
        self.propagate(node);
        self.allocated += 1;

        let id = node - first_leaf;
        log::trace!("indexed: allocated id {id}");
        Some(id)
    }

    fn release(&mut self, id: usize) {
        let Some(leaf) = self.leaf(id).filter(|&leaf| self.tree[leaf]) else {
            log::trace!("indexed: ignored release of id {id}, not in use");
            return;
        };
        self.tree.set(leaf, false);
        self.propagate(leaf);
        self.allocated -= 1;
        log::trace!("indexed: released id {id}");
    }

    fn check(&self, id: usize) -> bool {
        self.leaf(id).is_some_and(|leaf| !self.tree[leaf])
    }
}
