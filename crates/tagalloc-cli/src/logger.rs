//! A `log` backend writing colored records to stderr.

use std::fmt;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::style::{Color, WithFg};

static LOGGER: StderrLogger = StderrLogger;

/// Installs the stderr logger with the given maximum level.
pub fn init(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{} [{}] {}",
                LevelFormat(record.level()),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

struct LevelFormat(Level);

impl fmt::Display for LevelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (color, msg) = match self.0 {
            Level::Trace => (Color::Magenta, "TRACE"),
            Level::Debug => (Color::Blue, "DEBUG"),
            Level::Info => (Color::Green, " INFO"),
            Level::Warn => (Color::Yellow, " WARN"),
            Level::Error => (Color::Red, "ERROR"),
        };
        write!(f, "{}", WithFg::new(color, msg))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_format() {
        assert_eq!(
            LevelFormat(Level::Info).to_string(),
            "\x1B[32;1m INFO\x1B[0m"
        );
        assert_eq!(
            LevelFormat(Level::Error).to_string(),
            "\x1B[31;1mERROR\x1B[0m"
        );
    }
}
