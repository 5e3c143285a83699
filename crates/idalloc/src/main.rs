//! Runs ID allocator operations from the command line.
//!
//! ```text
//! $ idalloc --backend compact --capacity 3 'alloc*4' release:1 check:1 alloc stats
//! alloc -> 0
//! alloc -> 1
//! alloc -> 2
//! alloc -> exhausted
//! release 1
//! check 1 -> free
//! alloc -> 1
//! backend=compact capacity=3 allocated=3
//! ```

use std::{
    io::{self, Write as _},
    path::PathBuf,
    process::ExitCode,
};

use argh::FromArgs;
use id_allocator::{AnyIdAllocator, Backend, Capacity, CapacityError};
use log::LevelFilter;
use snafu::{Location, ResultExt as _, Snafu};

use self::{
    color::Colors,
    report::Report,
    script::{Op, ScriptError},
};

mod color;
mod logger;
mod report;
mod script;

/// Run ID allocator operations against one backend.
#[derive(Debug, FromArgs)]
struct Args {
    /// allocator backend: dense, compact or indexed (default: indexed)
    #[argh(option, default = "Backend::Indexed")]
    backend: Backend,
    /// number of IDs to manage
    #[argh(option)]
    capacity: i64,
    /// file with operations to run before the positional ones
    #[argh(option)]
    script: Option<PathBuf>,
    /// log level: off, error, warn, info, debug or trace (default: warn)
    #[argh(option, default = "LevelFilter::Warn")]
    log_level: LevelFilter,
    /// operations: alloc, alloc*K, release:ID, check:ID or stats
    #[argh(positional)]
    ops: Vec<Op>,
}

#[derive(Debug, Snafu)]
enum RunError {
    #[snafu(display("cannot create allocator"))]
    Capacity {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: CapacityError,
    },
    #[snafu(display("cannot load operations"))]
    Script {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: ScriptError,
    },
    #[snafu(display("failed to write output"))]
    Output {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        source: io::Error,
    },
}

impl RunError {
    fn location(&self) -> &Location {
        match self {
            Self::Capacity { location, .. }
            | Self::Script { location, .. }
            | Self::Output { location, .. } => location,
        }
    }
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    logger::init(args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", Report::new(err, Colors::detect(&io::stderr())));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), RunError> {
    let capacity = Capacity::try_from(args.capacity).context(CapacitySnafu)?;

    let mut ops = match &args.script {
        Some(path) => script::load(path).context(ScriptSnafu)?,
        None => Vec::new(),
    };
    ops.extend(args.ops);

    let mut allocator = AnyIdAllocator::new(args.backend, capacity);
    log::info!(
        "running {} operations on {} allocator, capacity={capacity}",
        ops.len(),
        args.backend
    );

    let mut stdout = io::stdout().lock();
    for op in ops {
        for outcome in script::apply(&mut allocator, op) {
            writeln!(stdout, "{outcome}").context(OutputSnafu)?;
        }
    }
    stdout.flush().context(OutputSnafu)?;
    Ok(())
}
