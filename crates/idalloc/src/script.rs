//! Allocator operations and the scripts that list them.
//!
//! An operation is one whitespace-free token:
//!
//! | Token | Effect |
//! |-------|--------|
//! | `alloc` | allocate one ID |
//! | `alloc*K` | allocate up to `K` IDs, stopping once none is free |
//! | `release:ID` | release `ID` |
//! | `check:ID` | report whether `ID` is free |
//! | `stats` | report backend, capacity and number of IDs in use |
//!
//! IDs are signed so that negative input reaches the allocator semantics
//! instead of failing to parse: a negative ID is never in range.
//!
//! A script file holds any number of tokens per line. `#` starts a comment.

use core::{fmt, num::ParseIntError, str::FromStr};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use id_allocator::{AnyIdAllocator, Backend, IdAllocator as _};
use snafu::{Location, ResultExt as _, Snafu, ensure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Alloc { count: usize },
    Release(i64),
    Check(i64),
    Stats,
}

#[derive(Debug, Snafu)]
pub enum ParseOpError {
    #[snafu(display(
        "unknown operation {input:?}, expected `alloc`, `alloc*K`, `release:ID`, `check:ID` or `stats`"
    ))]
    Unknown {
        input: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("invalid id in {input:?}"))]
    InvalidId {
        input: String,
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: ParseIntError,
    },
    #[snafu(display("invalid repeat count in {input:?}"))]
    InvalidCount {
        input: String,
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: ParseIntError,
    },
    #[snafu(display("repeat count must be at least 1 in {input:?}"))]
    ZeroCount {
        input: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ParseOpError {
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Self::Unknown { location, .. }
            | Self::InvalidId { location, .. }
            | Self::InvalidCount { location, .. }
            | Self::ZeroCount { location, .. } => location,
        }
    }
}

impl FromStr for Op {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(count) = s.strip_prefix("alloc*") {
            let count = count
                .parse::<usize>()
                .context(InvalidCountSnafu { input: s })?;
            ensure!(count > 0, ZeroCountSnafu { input: s });
            return Ok(Self::Alloc { count });
        }
        match s.split_once(':') {
            None if s == "alloc" => Ok(Self::Alloc { count: 1 }),
            None if s == "stats" => Ok(Self::Stats),
            Some(("release", id)) => Ok(Self::Release(parse_id(s, id)?)),
            Some(("check", id)) => Ok(Self::Check(parse_id(s, id)?)),
            _ => UnknownSnafu { input: s }.fail(),
        }
    }
}

fn parse_id(input: &str, id: &str) -> Result<i64, ParseOpError> {
    id.parse().context(InvalidIdSnafu { input })
}

#[derive(Debug, Snafu)]
pub enum ScriptError {
    #[snafu(display("failed to read script {}", path.display()))]
    Read {
        path: PathBuf,
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: io::Error,
    },
    #[snafu(display("invalid operation at {}:{line}", path.display()))]
    Parse {
        path: PathBuf,
        line: usize,
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: ParseOpError,
    },
}

impl ScriptError {
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Self::Read { location, .. } | Self::Parse { location, .. } => location,
        }
    }
}

/// Reads the operations listed in the script at `path`.
pub fn load(path: &Path) -> Result<Vec<Op>, ScriptError> {
    let text = fs::read_to_string(path).context(ReadSnafu { path })?;
    parse(path, &text)
}

fn parse(path: &Path, text: &str) -> Result<Vec<Op>, ScriptError> {
    let mut ops = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let tokens = line.split_once('#').map_or(line, |(tokens, _comment)| tokens);
        for token in tokens.split_whitespace() {
            let op = token.parse::<Op>().context(ParseSnafu {
                path,
                line: index + 1,
            })?;
            ops.push(op);
        }
    }
    Ok(ops)
}

/// The printable result of one allocator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allocated(usize),
    Exhausted,
    Released(i64),
    Checked {
        id: i64,
        free: bool,
    },
    Stats {
        backend: Backend,
        capacity: usize,
        allocated: usize,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocated(id) => write!(f, "alloc -> {id}"),
            Self::Exhausted => write!(f, "alloc -> exhausted"),
            Self::Released(id) => write!(f, "release {id}"),
            Self::Checked { id, free: true } => write!(f, "check {id} -> free"),
            Self::Checked { id, free: false } => write!(f, "check {id} -> not free"),
            Self::Stats {
                backend,
                capacity,
                allocated,
            } => write!(
                f,
                "backend={backend} capacity={capacity} allocated={allocated}"
            ),
        }
    }
}

/// Runs `op` against `allocator`.
pub fn apply(allocator: &mut AnyIdAllocator, op: Op) -> Vec<Outcome> {
    match op {
        Op::Alloc { count } => {
            // Nothing is released within one operation, so the first
            // exhaustion is also the last useful outcome.
            let mut outcomes = Vec::new();
            for _ in 0..count {
                let Some(id) = allocator.allocate() else {
                    outcomes.push(Outcome::Exhausted);
                    break;
                };
                outcomes.push(Outcome::Allocated(id));
            }
            outcomes
        }
        Op::Release(id) => {
            match usize::try_from(id) {
                Ok(id) => allocator.release(id),
                Err(_) => log::debug!("ignored release of negative id {id}"),
            }
            vec![Outcome::Released(id)]
        }
        Op::Check(id) => {
            let free = usize::try_from(id).is_ok_and(|id| allocator.check(id));
            vec![Outcome::Checked { id, free }]
        }
        Op::Stats => vec![Outcome::Stats {
            backend: allocator.backend(),
            capacity: allocator.capacity(),
            allocated: allocator.len(),
        }],
    }
}
