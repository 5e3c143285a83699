//! Bitmap ID allocator.
//!
//! One bit per ID (set = allocated) plus a cursor to the lowest free ID.
//! Release is O(1); allocate is O(1) to take the ID under the cursor but then
//! scans forward for the next clear bit, O(n) in the worst case.

use bitvec::vec::BitVec;

use crate::{Capacity, IdAllocator};

/// An ID allocator that needs one bit of state per ID.
///
/// Always hands out the lowest free ID.
///
/// # Examples
///
/// ```
/// use id_allocator::{Capacity, IdAllocator as _, compact::CompactIdAllocator};
///
/// let mut allocator = CompactIdAllocator::new(Capacity::new(3)?);
/// assert_eq!(allocator.allocate(), Some(0));
/// assert_eq!(allocator.allocate(), Some(1));
/// assert_eq!(allocator.allocate(), Some(2));
///
/// allocator.release(1);
/// allocator.release(0);
/// assert_eq!(allocator.allocate(), Some(0));
/// # Ok::<(), id_allocator::CapacityError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CompactIdAllocator {
    bits: BitVec,
    /// Lowest free ID, or the capacity when every ID is in use.
    next_free: usize,
    allocated: usize,
}

impl CompactIdAllocator {
    /// Creates an allocator with every ID in `0..capacity` free.
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        log::debug!("creating compact id allocator, capacity={capacity}");
        Self {
            bits: BitVec::repeat(false, capacity.get()),
            next_free: 0,
            allocated: 0,
        }
    }
}

impl IdAllocator for CompactIdAllocator {
    fn capacity(&self) -> usize {
        self.bits.len()
    }

    fn len(&self) -> usize {
        self.allocated
    }

    fn allocate(&mut self) -> Option<usize> {
        let capacity = self.bits.len();
        if self.next_free == capacity {
            log::debug!("compact: all {capacity} ids are in use");
            return None;
        }

        let id = self.next_free;
        debug_assert!(!self.bits[id], "cursor points at allocated id {id}");
        self.bits.set(id, true);
        self.allocated += 1;
        self.next_free = self.bits[id..]
            .first_zero()
            .map_or(capacity, |offset| id + offset);

        log::trace!("compact: allocated id {id}, next free {}", self.next_free);
        Some(id)
    }

    fn release(&mut self, id: usize) {
        if id >= self.bits.len() || !self.bits[id] {
            log::trace!("compact: ignored release of id {id}, not in use");
            return;
        }
        self.bits.set(id, false);
        self.allocated -= 1;
        self.next_free = usize::min(self.next_free, id);
        log::trace!("compact: released id {id}");
    }

    fn check(&self, id: usize) -> bool {
        id < self.bits.len() && !self.bits[id]
    }
}
