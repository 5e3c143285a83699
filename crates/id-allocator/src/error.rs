use core::num::ParseIntError;

use snafu::{Location, Snafu};

/// An allocator capacity that cannot be used to build an allocator.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CapacityError {
    #[snafu(display("capacity must not be negative, got {capacity}"))]
    Negative {
        capacity: i64,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("capacity {capacity} exceeds the maximum of {max}"))]
    TooLarge {
        capacity: u64,
        max: u64,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("invalid capacity {input:?}"))]
    Parse {
        input: String,
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: ParseIntError,
    },
}

impl CapacityError {
    /// Returns where the error was raised.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Self::Negative { location, .. }
            | Self::TooLarge { location, .. }
            | Self::Parse { location, .. } => location,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("unknown backend {input:?}, expected one of `dense`, `compact` or `indexed`"))]
#[snafu(visibility(pub(crate)))]
pub struct ParseBackendError {
    input: String,
    #[snafu(implicit)]
    location: Location,
}

impl ParseBackendError {
    /// Returns where the error was raised.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }
}
