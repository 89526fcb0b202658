// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::error::ParseLevelError;
use std::fmt::Display;
use std::str::FromStr;

/**
Severity of a log record.

Levels are ordered from most verbose to most severe, so a threshold admits
every level that compares `>=` to it.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// Detailed diagnostics, usually disabled
    Debug,
    /// Normal operation
    #[default]
    Info,
    /// Suspicious condition
    Warning,
    /// Runtime error
    Error,
}

impl Level {
    /// The tag rendered between brackets in an output line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
