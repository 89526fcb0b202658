// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::sink::Sink;
use std::io::Write;

/// Which standard stream a [`ConsoleSink`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsoleTarget {
    #[default]
    Stderr,
    Stdout,
}

/**
A sink that writes to the process's stderr or stdout.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConsoleSink {
    target: ConsoleTarget,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug/Clone/Copy: derived - the sink holds only the target selector
// - PartialEq/Eq/Hash: derived - two sinks are equal when they address the same stream
// - Default: stderr, the conventional diagnostics stream
// - Display: NOT implemented - no meaningful string representation

impl ConsoleSink {
    pub const fn new(target: ConsoleTarget) -> Self {
        Self { target }
    }

    pub const fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    pub const fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl Sink for ConsoleSink {
    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        match self.target {
            ConsoleTarget::Stderr => {
                let mut lock = std::io::stderr().lock();
                lock.write_all(line.as_bytes())?;
                lock.write_all(b"\n")
            }
            ConsoleTarget::Stdout => {
                let mut lock = std::io::stdout().lock();
                lock.write_all(line.as_bytes())?;
                lock.write_all(b"\n")
            }
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.target {
            ConsoleTarget::Stderr => std::io::stderr().flush(),
            ConsoleTarget::Stdout => std::io::stdout().flush(),
        }
    }
}
