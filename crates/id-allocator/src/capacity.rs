use core::{fmt, str::FromStr};

use snafu::{ResultExt as _, ensure};

use crate::error::{CapacityError, NegativeSnafu, ParseSnafu, TooLargeSnafu};

/// The number of IDs an allocator manages.
///
/// An allocator built with capacity `n` hands out the IDs `0..n`. The
/// capacity is fixed for the lifetime of the allocator.
///
/// Values above [`Capacity::MAX`] are rejected so that the `2n - 1` bit tree
/// of [`IndexedIdAllocator`](crate::indexed::IndexedIdAllocator) always fits
/// in a bit vector.
///
/// # Examples
///
/// ```
/// use id_allocator::Capacity;
///
/// let capacity = Capacity::new(16)?;
/// assert_eq!(capacity.get(), 16);
///
/// assert!(Capacity::try_from(-1_i64).is_err());
/// assert_eq!("8".parse::<Capacity>()?.get(), 8);
/// # Ok::<(), id_allocator::CapacityError>(())
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(usize);

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Capacity {
    /// The largest supported capacity.
    pub const MAX: Self = Self(usize::MAX >> 4);

    /// A capacity with no IDs at all.
    pub const ZERO: Self = Self(0);

    /// Creates a capacity of `capacity` IDs.
    #[track_caller]
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        ensure!(
            capacity <= Self::MAX.0,
            TooLargeSnafu {
                capacity: widen(capacity),
                max: widen(Self::MAX.0),
            }
        );
        Ok(Self(capacity))
    }

    /// Returns the number of IDs.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns `true` if `id` lies in `0..capacity`.
    #[must_use]
    pub const fn contains(self, id: usize) -> bool {
        id < self.0
    }
}

/// `usize` is at most 64 bits on every supported target.
fn widen(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl From<Capacity> for usize {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

impl TryFrom<usize> for Capacity {
    type Error = CapacityError;

    #[track_caller]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Capacity {
    type Error = CapacityError;

    #[track_caller]
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        ensure!(value >= 0, NegativeSnafu { capacity: value });
        let Ok(capacity) = usize::try_from(value) else {
            return TooLargeSnafu {
                capacity: value.unsigned_abs(),
                max: widen(Self::MAX.0),
            }
            .fail();
        };
        Self::new(capacity)
    }
}

impl FromStr for Capacity {
    type Err = CapacityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<i64>().context(ParseSnafu { input: s })?;
        Self::try_from(value)
    }
}
