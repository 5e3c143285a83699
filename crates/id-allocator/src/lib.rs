//! Allocators for integer IDs from a fixed range.
//!
//! An ID allocator hands out unique IDs from `0..n` and takes them back for
//! reuse once they are released. The capacity `n` is fixed when the allocator
//! is created. Every allocator implements the [`IdAllocator`] trait, and the
//! crate provides three backends that trade memory for speed.
//!
//! # Available Allocators
//!
//! ## [`DenseIdAllocator`](dense::DenseIdAllocator)
//!
//! Keeps a queue of free IDs and a set of allocated IDs. Best suited when raw
//! speed matters more than memory.
//!
//! ## [`CompactIdAllocator`](compact::CompactIdAllocator)
//!
//! One bit per ID and a cursor to the lowest free ID. Best suited when memory
//! is tight and allocation is rare or mostly sequential.
//!
//! ## [`IndexedIdAllocator`](indexed::IndexedIdAllocator)
//!
//! A binary tree of "subtree is full" bits over the per-ID bitmap. Best
//! suited when both latency and memory matter.
//!
//! # Performance Characteristics
//!
//! | Allocator | Allocate | Release | Memory |
//! |-----------|----------|---------|--------|
//! | `DenseIdAllocator` | O(1)* | O(1)* | O(n) words |
//! | `CompactIdAllocator` | O(n) | O(1) | n bits |
//! | `IndexedIdAllocator` | O(log n) | O(log n) | 2n - 1 bits |
//!
//! *amortized
//!
//! # Usage
//!
//! ```rust
//! use id_allocator::{AnyIdAllocator, Backend, Capacity, IdAllocator as _};
//!
//! let mut allocator = AnyIdAllocator::new(Backend::Indexed, Capacity::new(3)?);
//!
//! let mut ids = Vec::new();
//! while let Some(id) = allocator.allocate() {
//!     ids.push(id);
//! }
//! ids.sort_unstable();
//! assert_eq!(ids, [0, 1, 2]);
//!
//! allocator.release(1);
//! assert!(allocator.check(1));
//! assert_eq!(allocator.allocate(), Some(1));
//!
//! // Releasing an ID that is not in use is ignored.
//! allocator.release(7);
//! assert!(!allocator.check(7));
//! # Ok::<(), id_allocator::CapacityError>(())
//! ```
//!
//! # Thread Safety
//!
//! The allocators are `Send` and `Sync`, but every mutating operation takes
//! `&mut self`. Callers that share one allocator between threads must wrap it
//! in a lock.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use core::{fmt, str::FromStr};

pub use self::{
    capacity::Capacity,
    error::{CapacityError, ParseBackendError},
};
use self::{
    compact::CompactIdAllocator, dense::DenseIdAllocator, error::ParseBackendSnafu,
    indexed::IndexedIdAllocator,
};

mod capacity;
pub mod compact;
pub mod dense;
mod error;
pub mod indexed;

/// Hands out unique IDs from `0..capacity` and takes them back for reuse.
///
/// An ID is always either free or in use. Every ID starts out free.
pub trait IdAllocator {
    /// Returns the number of IDs this allocator manages.
    fn capacity(&self) -> usize;

    /// Returns the number of IDs currently in use.
    fn len(&self) -> usize;

    /// Returns `true` if no ID is in use.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if every ID is in use.
    fn is_exhausted(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Marks a free ID as in use and returns it.
    ///
    /// Returns `None` if every ID is in use.
    fn allocate(&mut self) -> Option<usize>;

    /// Marks `id` as free again.
    ///
    /// Does nothing if `id` is out of range or already free.
    fn release(&mut self, id: usize);

    /// Returns `true` if `id` is in range and free.
    fn check(&self, id: usize) -> bool;
}

/// Selects one of the allocator backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Backend {
    /// [`DenseIdAllocator`]
    Dense,
    /// [`CompactIdAllocator`]
    Compact,
    /// [`IndexedIdAllocator`]
    Indexed,
}

impl Backend {
    pub const ALL: [Self; 3] = [Self::Dense, Self::Compact, Self::Indexed];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Compact => "compact",
            Self::Indexed => "indexed",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|backend| backend.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseBackendSnafu { input: s }.build())
    }
}

/// An allocator whose backend is chosen when it is created.
#[derive(Debug, Clone)]
pub enum AnyIdAllocator {
    Dense(DenseIdAllocator),
    Compact(CompactIdAllocator),
    Indexed(IndexedIdAllocator),
}

macro_rules! dispatch {
    ($this:expr, $allocator:ident => $body:expr) => {
        match $this {
            Self::Dense($allocator) => $body,
            Self::Compact($allocator) => $body,
            Self::Indexed($allocator) => $body,
        }
    };
}

impl AnyIdAllocator {
    /// Creates an allocator of the given backend with every ID free.
    #[must_use]
    pub fn new(backend: Backend, capacity: Capacity) -> Self {
        match backend {
            Backend::Dense => Self::Dense(DenseIdAllocator::new(capacity)),
            Backend::Compact => Self::Compact(CompactIdAllocator::new(capacity)),
            Backend::Indexed => Self::Indexed(IndexedIdAllocator::new(capacity)),
        }
    }

    /// Returns the backend of this allocator.
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Dense(_) => Backend::Dense,
            Self::Compact(_) => Backend::Compact,
            Self::Indexed(_) => Backend::Indexed,
        }
    }
}

impl IdAllocator for AnyIdAllocator {
    fn capacity(&self) -> usize {
        dispatch!(self, a => a.capacity())
    }

    fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    fn allocate(&mut self) -> Option<usize> {
        dispatch!(self, a => a.allocate())
    }

    fn release(&mut self, id: usize) {
        dispatch!(self, a => a.release(id));
    }

    fn check(&self, id: usize) -> bool {
        dispatch!(self, a => a.check(id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    fn allocators(capacity: usize) -> [AnyIdAllocator; 3] {
        let capacity = Capacity::new(capacity).unwrap();
        Backend::ALL.map(|backend| AnyIdAllocator::new(backend, capacity))
    }

    fn assert_consistent(allocator: &AnyIdAllocator) {
        if let AnyIdAllocator::Indexed(indexed) = allocator {
            indexed.assert_tree_consistent();
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("dense".parse::<Backend>().unwrap(), Backend::Dense);
        assert_eq!("Compact".parse::<Backend>().unwrap(), Backend::Compact);
        assert_eq!(" INDEXED ".parse::<Backend>().unwrap(), Backend::Indexed);
        let err = "heap".parse::<Backend>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown backend \"heap\", expected one of `dense`, `compact` or `indexed`"
        );
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in Backend::ALL {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
            assert_eq!(AnyIdAllocator::new(backend, Capacity::ZERO).backend(), backend);
        }
    }

    #[test]
    fn test_zero_capacity() {
        for mut allocator in allocators(0) {
            assert_eq!(allocator.allocate(), None, "{}", allocator.backend());
            assert!(!allocator.check(0));
            allocator.release(0);
            assert!(allocator.is_empty());
            assert!(allocator.is_exhausted());
        }
    }

    #[test]
    fn test_capacity_three() {
        for mut allocator in allocators(3) {
            let backend = allocator.backend();
            let mut ids: Vec<_> = (0..3).map(|_| allocator.allocate().unwrap()).collect();
            ids.sort_unstable();
            assert_eq!(ids, [0, 1, 2], "{backend}");
            assert_eq!(allocator.allocate(), None, "{backend}");
            assert!(allocator.is_exhausted());

            allocator.release(1);
            assert!(allocator.check(1), "{backend}");
            assert_eq!(allocator.allocate(), Some(1), "{backend}");
        }
    }

    #[test]
    fn test_released_id_is_reused() {
        for mut allocator in allocators(5) {
            let backend = allocator.backend();
            let ids: Vec<_> = (0..4).map(|_| allocator.allocate().unwrap()).collect();
            assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), 4, "{backend}");
            assert!(ids.iter().all(|&id| id < 5), "{backend}");

            allocator.release(ids[1]);
            let id = allocator.allocate().unwrap();
            match backend {
                Backend::Compact | Backend::Indexed => assert_eq!(id, ids[1], "{backend}"),
                Backend::Dense => assert!(!ids.contains(&id) || id == ids[1], "{id}"),
            }
        }
    }

    #[test]
    fn test_check_in_range_and_out_of_range() {
        for mut allocator in allocators(4) {
            let backend = allocator.backend();
            // in range and untouched
            assert!(allocator.check(3), "{backend}");
            // never valid
            assert!(!allocator.check(4), "{backend}");
            assert!(!allocator.check(usize::MAX), "{backend}");

            let id = allocator.allocate().unwrap();
            assert!(!allocator.check(id), "{backend}");
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        for mut allocator in allocators(4) {
            let backend = allocator.backend();
            let a = allocator.allocate().unwrap();
            let b = allocator.allocate().unwrap();

            allocator.release(a);
            let once = allocator.clone();
            allocator.release(a);
            assert_eq!(allocator.len(), once.len(), "{backend}");
            for id in 0..6 {
                assert_eq!(allocator.check(id), once.check(id), "{backend}");
            }
            assert!(!allocator.check(b));
        }
    }

    #[test]
    fn test_release_never_allocated() {
        for mut allocator in allocators(4) {
            let backend = allocator.backend();
            allocator.release(2);
            allocator.release(2);
            allocator.release(9);
            assert!(allocator.is_empty(), "{backend}");

            let ids: BTreeSet<_> = core::iter::from_fn(|| allocator.allocate()).collect();
            assert_eq!(ids, (0..4).collect::<BTreeSet<_>>(), "{backend}");
            assert_consistent(&allocator);
        }
    }

    /// Allocates until exhaustion, then releases in ascending order, checking
    /// after each allocation (when `every_step` is set) and after each release
    /// that all backends hold the same IDs.
    fn fill_and_drain(capacity: usize, every_step: bool) {
        let mut allocators = allocators(capacity);
        let mut live: [BTreeSet<usize>; 3] = Default::default();
        let full = (0..capacity).collect::<BTreeSet<_>>();
        for round in 0..3 {
            for step in 0..=capacity {
                let results = allocators.each_mut().map(IdAllocator::allocate);
                for (set, result) in live.iter_mut().zip(results) {
                    if let Some(id) = result {
                        assert!(set.insert(id), "{id} handed out twice");
                    }
                }
                assert!(
                    results.iter().all(|r| r.is_some() == (step < capacity)),
                    "round {round} step {step}: {results:?}"
                );
                if every_step {
                    assert!(
                        live.iter().all(|set| *set == live[0]),
                        "round {round} step {step}: {live:?}"
                    );
                }
            }
            assert!(live.iter().all(|set| *set == full), "round {round}");

            for id in 0..capacity {
                for (allocator, set) in allocators.iter_mut().zip(&mut live) {
                    allocator.release(id);
                    set.remove(&id);
                }
                assert!(live.iter().all(|set| *set == live[0]));
            }
            for allocator in &allocators {
                assert!(allocator.is_empty());
                assert_consistent(allocator);
            }
        }
    }

    #[test]
    fn test_backends_agree_at_every_step_for_power_of_two() {
        fill_and_drain(1, true);
        fill_and_drain(8, true);
        fill_and_drain(16, true);
    }

    #[test]
    fn test_backends_agree_when_full_and_empty() {
        fill_and_drain(11, false);
        fill_and_drain(3, false);
    }

    #[test]
    fn test_indexed_order_differs_for_odd_capacity() {
        let [_, mut compact, mut indexed] = allocators(11);
        assert_eq!(compact.allocate(), Some(0));
        assert_eq!(indexed.allocate(), Some(5));
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Allocate,
        Release(usize),
        Check(usize),
    }

    fn op(capacity: usize) -> impl Strategy<Value = Op> {
        // Reach a little past the end to cover out-of-range IDs.
        let id = 0..capacity + 3;
        prop_oneof![
            3 => Just(Op::Allocate),
            2 => id.clone().prop_map(Op::Release),
            1 => id.prop_map(Op::Check),
        ]
    }

    fn scenario() -> impl Strategy<Value = (usize, Vec<Op>)> {
        (0_usize..40).prop_flat_map(|capacity| {
            (Just(capacity), prop::collection::vec(op(capacity), 0..300))
        })
    }

    proptest! {
        #[test]
        fn prop_backends_match_model((capacity, ops) in scenario()) {
            for mut allocator in allocators(capacity) {
                let backend = allocator.backend();
                let mut in_use = BTreeSet::new();
                for op in &ops {
                    match *op {
                        Op::Allocate => match allocator.allocate() {
                            Some(id) => {
                                prop_assert!(id < capacity, "{backend}: {id} out of range");
                                if backend == Backend::Compact {
                                    let lowest = (0..capacity).find(|id| !in_use.contains(id));
                                    prop_assert_eq!(lowest, Some(id));
                                }
                                prop_assert!(in_use.insert(id), "{backend}: {id} handed out twice");
                            }
                            None => {
                                prop_assert_eq!(in_use.len(), capacity, "{}", backend);
                            }
                        },
                        Op::Release(id) => {
                            allocator.release(id);
                            in_use.remove(&id);
                            prop_assert_eq!(allocator.check(id), id < capacity);
                        }
                        Op::Check(id) => {
                            let free = id < capacity && !in_use.contains(&id);
                            prop_assert_eq!(allocator.check(id), free);
                        }
                    }
                    prop_assert_eq!(allocator.len(), in_use.len());
                }
                assert_consistent(&allocator);
            }
        }
    }
}
