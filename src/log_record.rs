// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type for the logspool pipeline.
//!
//! A [`LogRecord`] is created by the facade at call time, owned by the shared queue
//! until the writer swaps it out, and dropped once both sinks have seen it.
//!
//! # Output format
//!
//! ```text
//! 18:33:54.208 [DEBUG] main: debug message
//! ```
//!
//! The time is rendered in the local time zone with millisecond resolution. Rendering
//! reads only the record itself, so formatting the same record twice produces the same
//! bytes.
//!
//! # Example
//!
//! ```rust
//! use logspool::{Level, LogRecord};
//!
//! let record = LogRecord::now(Level::Warning, "importer", "image is empty");
//! let line = record.to_string();
//! assert!(line.ends_with(" [WARNING] importer: image is empty"));
//! ```

use crate::Level;
use std::fmt::{Debug, Display};
use std::time::SystemTime;

/**
One log entry.

Immutable once created. The message is stored already rendered; the timestamp is
stored as wall-clock time and only converted to the local zone when displayed.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogRecord {
    timestamp: SystemTime,
    level: Level,
    caller: String,
    message: String,
}

impl LogRecord {
    pub fn new(
        timestamp: SystemTime,
        level: Level,
        caller: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            caller: caller.into(),
            message: message.into(),
        }
    }

    /**
    Creates a record stamped with the current time.
    */
    pub fn now(level: Level, caller: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(SystemTime::now(), level, caller, message)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            crate::sys::format_time_of_day(self.timestamp),
            self.level,
            self.caller,
            self.message
        )
    }
}

/// Shortens `message` to at most `max_bytes` bytes plus an ellipsis, cutting on a
/// char boundary.
pub(crate) fn truncate_message(mut message: String, max_bytes: usize) -> String {
    if message.len() <= max_bytes {
        return message;
    }
    let mut cut = max_bytes;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    message.truncate(cut);
    message.push('…');
    message
}

/*
Boilerplate notes for LogRecord:

IMPLEMENTED:
- Debug, Clone: Derived
- PartialEq/Eq/Hash: Derived - records compare by content, which tests rely on
- Display: the output line format

NOT IMPLEMENTED:
- Default: a record without a caller or message is meaningless
- Ord/PartialOrd: queue order, not timestamp order, is the output order
- Copy: owns heap data

AUTOMATIC:
- Send/Sync: all fields are Send + Sync, which the queue requires
*/
