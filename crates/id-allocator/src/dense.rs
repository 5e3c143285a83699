//! Queue-backed ID allocator.
//!
//! Free IDs wait in a FIFO queue and allocated IDs are kept in a hash set, so
//! every operation runs in O(1) amortized time. Both structures together hold
//! one entry per ID, which makes this the most memory hungry backend.

use std::collections::{HashSet, VecDeque};

use crate::{Capacity, IdAllocator};

/// An ID allocator with O(1) allocate and release.
///
/// IDs are handed out in FIFO order: initially `0, 1, 2, ...`, and released
/// IDs are queued behind every ID that is already free.
///
/// # Examples
///
/// ```
/// use id_allocator::{Capacity, IdAllocator as _, dense::DenseIdAllocator};
///
/// let mut allocator = DenseIdAllocator::new(Capacity::new(2)?);
/// assert_eq!(allocator.allocate(), Some(0));
/// assert_eq!(allocator.allocate(), Some(1));
/// assert_eq!(allocator.allocate(), None);
///
/// allocator.release(0);
/// assert!(allocator.check(0));
/// assert_eq!(allocator.allocate(), Some(0));
/// # Ok::<(), id_allocator::CapacityError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DenseIdAllocator {
    capacity: Capacity,
    free: VecDeque<usize>,
    used: HashSet<usize>,
}

impl DenseIdAllocator {
    /// Creates an allocator with every ID in `0..capacity` free.
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        log::debug!("creating dense id allocator, capacity={capacity}");
        Self {
            capacity,
            free: (0..capacity.get()).collect(),
            used: HashSet::new(),
        }
    }
}

impl IdAllocator for DenseIdAllocator {
    fn capacity(&self) -> usize {
        self.capacity.get()
    }

    fn len(&self) -> usize {
        self.used.len()
    }

    fn allocate(&mut self) -> Option<usize> {
        let Some(id) = self.free.pop_front() else {
            log::debug!("dense: all {} ids are in use", self.capacity);
            return None;
        };
        let inserted = self.used.insert(id);
        debug_assert!(inserted, "id {id} was both free and in use");
        log::trace!("dense: allocated id {id}");
        Some(id)
    }

    fn release(&mut self, id: usize) {
        // Out-of-range IDs are never in `used`.
        if !self.used.remove(&id) {
            log::trace!("dense: ignored release of id {id}, not in use");
            return;
        }
        self.free.push_back(id);
        log::trace!("dense: released id {id}");
    }

    fn check(&self, id: usize) -> bool {
        self.capacity.contains(id) && !self.used.contains(&id)
    }
}
