use core::fmt;
use std::{
    io::{self, Write as _},
    sync::OnceLock,
    time::Instant,
};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::color::{Color, Colors};

static LOGGER: StderrLogger = StderrLogger {
    start: OnceLock::new(),
    colors: OnceLock::new(),
};

/// Writes log records to stderr as `[seconds] LEVEL target: message`.
struct StderrLogger {
    start: OnceLock<Instant>,
    colors: OnceLock<Colors>,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.start.get_or_init(Instant::now).elapsed();
        let colors = *self.colors.get_or_init(|| Colors::detect(&io::stderr()));
        let mut stderr = io::stderr().lock();
        // Nowhere left to report a failing stderr.
        let _ = writeln!(
            stderr,
            "[{:>4}.{:06}] {} {}: {}",
            elapsed.as_secs(),
            elapsed.subsec_micros(),
            LevelFormat(record.level(), colors),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Installs the stderr logger. Later calls only change the level.
pub fn init(level: LevelFilter) {
    LOGGER.start.get_or_init(Instant::now);
    LOGGER.colors.get_or_init(|| Colors::detect(&io::stderr()));
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("logger already installed");
    }
    log::set_max_level(level);
}

struct LevelFormat(Level, Colors);

impl fmt::Display for LevelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = match self.0 {
            Level::Trace => Color::Magenta,
            Level::Debug => Color::Blue,
            Level::Info => Color::Green,
            Level::Warn => Color::Yellow,
            Level::Error => Color::Red,
        };
        let msg = match self.0 {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => " INFO",
            Level::Warn => " WARN",
            Level::Error => "ERROR",
        };
        fmt::Display::fmt(&self.1.paint(color, msg), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_format_is_fixed_width() {
        for level in [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
        ] {
            let plain = LevelFormat(level, Colors::Off).to_string();
            assert_eq!(plain.trim(), level.as_str());
            let text = LevelFormat(level, Colors::On).to_string();
            let tag = text
                .strip_prefix("\x1B[")
                .and_then(|s| s.split_once('m'))
                .map(|(_, rest)| rest.trim_end_matches("\x1B[0m"))
                .unwrap();
            assert_eq!(tag.len(), 5, "{level}");
            assert_eq!(tag.trim(), level.as_str());
        }
    }

    #[test]
    fn test_init_sets_level() {
        init(LevelFilter::Debug);
        assert_eq!(log::max_level(), LevelFilter::Debug);
        assert!(LOGGER.enabled(&Metadata::builder().level(Level::Debug).build()));
        assert!(!LOGGER.enabled(&Metadata::builder().level(Level::Trace).build()));
        init(LevelFilter::Off);
        assert_eq!(log::max_level(), LevelFilter::Off);
    }
}
