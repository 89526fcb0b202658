// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Sink
//!
//! A sink that keeps lines in memory instead of writing them to a device. It is
//! meant for:
//!
//! - Unit testing code that logs through an [`AsyncLogger`](crate::AsyncLogger)
//! - Hosts that want to inspect or forward output themselves
//!
//! ## Architecture
//!
//! The buffer lives behind an `Arc<Mutex<..>>`. Cloning an `InMemorySink` yields a
//! handle onto the same buffer, so a test keeps one clone and hands the other to the
//! logger, which moves it into the writer thread.
//!
//! A sink can be switched into a failing mode, in which every write and flush returns
//! an error. This lets tests exercise the writer's failure handling.

use crate::sink::Sink;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Shared {
    lines: Mutex<Vec<String>>,
    failing: AtomicBool,
}

/// A sink that stores lines in a shared `Vec<String>`.
///
/// # Example
///
/// ```rust
/// use logspool::{AsyncLogger, InMemorySink, Level, LoggerConfig};
///
/// let console = InMemorySink::new();
/// let file = InMemorySink::new();
/// let config = LoggerConfig::default().with_startup_banner(false);
/// let logger = AsyncLogger::with_sinks(config, Box::new(console.clone()), Some(Box::new(file.clone())));
///
/// logger.add_log("main", "hello", Level::Info);
/// logger.shutdown();
///
/// let logs = file.drain_logs();
/// assert!(logs.contains("[INFO] main: hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    shared: Arc<Shared>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived, required by Sink
// - Default: an empty buffer
// - Clone: derived - clones share the buffer, which is how tests observe output
// - PartialEq/Eq/Hash: NOT implemented - equality of shared buffers is unclear
// - Send/Sync: automatic through Arc and Mutex

impl InMemorySink {
    /// Creates a sink with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all lines joined by newlines and clears the buffer.
    pub fn drain_logs(&self) -> String {
        let mut lines = self.shared.lines.lock();
        let result = lines.join("\n");
        lines.clear();
        result
    }

    /// Returns a copy of the buffered lines without clearing them.
    pub fn lines(&self) -> Vec<String> {
        self.shared.lines.lock().clone()
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.shared.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When `failing` is set, writes and flushes return an error and store nothing.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::Relaxed);
    }

    fn check_failing(&self) -> std::io::Result<()> {
        if self.shared.failing.load(Ordering::Relaxed) {
            Err(std::io::Error::other("in-memory sink set to fail"))
        } else {
            Ok(())
        }
    }
}

impl Sink for InMemorySink {
    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.check_failing()?;
        self.shared.lines.lock().push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.check_failing()
    }
}
