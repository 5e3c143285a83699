//! Bold foreground colors for terminal output.
//!
//! Colors are only written when the output stream is a terminal and the
//! `NO_COLOR` environment variable is unset or empty.

use core::fmt;
use std::{env, ffi::OsStr, io::IsTerminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    DarkGray,
}

impl Color {
    const fn sgr(self) -> u8 {
        match self {
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::DarkGray => 90,
        }
    }
}

/// Whether escape sequences are emitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Colors {
    On,
    #[default]
    Off,
}

impl Colors {
    /// Picks colors for `stream`.
    pub fn detect(stream: &impl IsTerminal) -> Self {
        Self::choose(stream.is_terminal(), env::var_os("NO_COLOR").as_deref())
    }

    fn choose(terminal: bool, no_color: Option<&OsStr>) -> Self {
        if terminal && no_color.is_none_or(OsStr::is_empty) {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Wraps `value` so that it displays in bold `color` when colors are on.
    pub fn paint<T>(self, color: Color, value: T) -> Painted<T> {
        let color = match self {
            Self::On => Some(color),
            Self::Off => None,
        };
        Painted { color, value }
    }
}

pub struct Painted<T> {
    color: Option<Color>,
    value: T,
}

impl<T> fmt::Display for Painted<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(color) = self.color else {
            return fmt::Display::fmt(&self.value, f);
        };
        write!(f, "\x1B[{};1m{}\x1B[0m", color.sgr(), self.value)
    }
}
