use core::{error::Error, fmt, iter};

use id_allocator::{CapacityError, ParseBackendError};
use snafu::Location;

use crate::{
    RunError,
    color::{Color, Colors},
    script::{ParseOpError, ScriptError},
};

/// Formats an error and its sources, each with the location it was raised at.
///
/// ```text
/// Error: cannot create allocator
///   at crates/idalloc/src/main.rs:105:55
///
/// Caused by:
///    0: capacity must not be negative, got -1
///       at crates/idalloc/src/main.rs:105:20
/// ```
pub struct Report<E> {
    error: E,
    colors: Colors,
}

impl<E> Report<E> {
    pub const fn new(error: E, colors: Colors) -> Self {
        Self { error, colors }
    }
}

impl<E> Report<E>
where
    E: Error + 'static,
{
    fn write_location(
        &self,
        f: &mut fmt::Formatter<'_>,
        indent: usize,
        error: &(dyn Error + 'static),
    ) -> fmt::Result {
        match location(error) {
            Some(loc) => writeln!(
                f,
                "{:indent$}at {}",
                "",
                self.colors.paint(Color::DarkGray, loc)
            ),
            None => Ok(()),
        }
    }
}

impl<E> fmt::Debug for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<E> fmt::Display for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.colors.paint(Color::Red, &self.error))?;
        self.write_location(f, 2, &self.error)?;

        let mut sources = iter::successors(self.error.source(), |&e| e.source()).peekable();
        if sources.peek().is_some() {
            writeln!(f, "\nCaused by:")?;
        }
        for (depth, source) in sources.enumerate() {
            writeln!(f, "{depth:4}: {}", self.colors.paint(Color::Red, source))?;
            self.write_location(f, 6, source)?;
        }
        Ok(())
    }
}

/// Finds the location recorded by the error types of this workspace.
fn location<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a Location> {
    if let Some(e) = error.downcast_ref::<RunError>() {
        return Some(e.location());
    }
    if let Some(e) = error.downcast_ref::<ScriptError>() {
        return Some(e.location());
    }
    if let Some(e) = error.downcast_ref::<ParseOpError>() {
        return Some(e.location());
    }
    if let Some(e) = error.downcast_ref::<CapacityError>() {
        return Some(e.location());
    }
    error
        .downcast_ref::<ParseBackendError>()
        .map(ParseBackendError::location)
}
