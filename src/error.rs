// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.
//!
//! None of these reach producers: [`AsyncLogger::add_log`](crate::AsyncLogger::add_log)
//! never fails. They exist so construction and the writer can describe what went
//! wrong when they report on the console.

use std::path::PathBuf;
use thiserror::Error;

/// Failures inside the logging pipeline.
#[derive(Error, Debug)]
pub enum LogError {
    /// The durable sink could not be opened for appending
    #[error("cannot open log file {path:?}: {source}")]
    OpenSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The background writer thread could not be started
    #[error("cannot start writer thread: {0}")]
    SpawnWriter(#[source] std::io::Error),

    /// A sink rejected a write or flush
    #[error("write to {sink} sink failed: {source}")]
    Write {
        sink: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// A rejected configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("flush queue item count must be at least 1")]
    ZeroFlushCount,

    #[error("flush period must be non-zero")]
    ZeroFlushPeriod,

    /// An environment variable held a value that could not be parsed
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Returned by `str::parse::<Level>` for unknown names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level {0:?}")]
pub struct ParseLevelError(pub(crate) String);
