// SPDX-License-Identifier: MIT OR Apache-2.0

//! The optional process-wide logger.
//!
//! Components that cannot have an [`AsyncLogger`] passed to them can log through a
//! single process-wide instance instead. The instance is created by the first call
//! to [`init`]; its level and destination are fixed from then on, and later calls
//! to [`init`] return the existing instance unchanged.
//!
//! A `static` is never dropped, so the process must call [`shutdown`] before exiting
//! to get the drain-before-exit guarantee. Records logged after that go straight to
//! the console.
//!
//! # Example
//!
//! ```
//! use logspool::global_logger;
//! use logspool::{Level, LoggerConfig};
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("app.log");
//!
//! global_logger::init(LoggerConfig::new(Level::Debug, &path));
//! global_logger::add_log("importer", "image Width: 640", Level::Info);
//! global_logger::shutdown();
//! ```

use crate::console_sink::ConsoleSink;
use crate::log_record::LogRecord;
use crate::writer::INTERNAL_CALLER;
use crate::{AsyncLogger, Level, LoggerConfig};
use std::sync::OnceLock;

static GLOBAL_LOGGER: OnceLock<AsyncLogger> = OnceLock::new();

/// Creates the process-wide logger on first call and returns it.
///
/// `config` is ignored if the logger already exists.
pub fn init(config: LoggerConfig) -> &'static AsyncLogger {
    GLOBAL_LOGGER.get_or_init(|| AsyncLogger::new(config))
}

/// Like [`init`], with the configuration read from `LOGSPOOL_*` variables.
///
/// A malformed variable is reported on the console, ahead of any record, and the
/// defaults are used.
pub fn init_from_env() -> &'static AsyncLogger {
    GLOBAL_LOGGER.get_or_init(|| {
        let (config, notices) = env_config(|var| std::env::var(var).ok());
        let console = Box::new(ConsoleSink::new(config.console));
        AsyncLogger::open(config, console, notices)
    })
}

fn env_config(lookup: impl Fn(&'static str) -> Option<String>) -> (LoggerConfig, Vec<LogRecord>) {
    match LoggerConfig::from_lookup(lookup) {
        Ok(config) => (config, Vec::new()),
        Err(e) => {
            let notice = LogRecord::now(
                Level::Warning,
                INTERNAL_CALLER,
                format!("{e}; using the default configuration"),
            );
            (LoggerConfig::default(), vec![notice])
        }
    }
}

/// The process-wide logger, if [`init`] has run.
pub fn logger() -> Option<&'static AsyncLogger> {
    GLOBAL_LOGGER.get()
}

/// Logs through the process-wide logger. Does nothing before [`init`].
pub fn add_log(caller: &str, message: impl Into<String>, level: Level) {
    if let Some(logger) = logger() {
        logger.add_log(caller, message, level);
    }
}

/// Drains and stops the process-wide logger. Does nothing before [`init`].
pub fn shutdown() {
    if let Some(logger) = logger() {
        logger.shutdown();
    }
}
