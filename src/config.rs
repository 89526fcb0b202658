// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logger configuration.
//!
//! A [`LoggerConfig`] is consumed by [`AsyncLogger::new`](crate::AsyncLogger::new) and
//! frozen for the logger's lifetime. It is built either with the `with_*` methods or
//! from environment variables via [`LoggerConfig::from_env`].
//!
//! | variable                   | field                    |
//! |----------------------------|--------------------------|
//! | `LOGSPOOL_LEVEL`           | `level`                  |
//! | `LOGSPOOL_PATH`            | `path`                   |
//! | `LOGSPOOL_FLUSH_PERIOD_MS` | `flush_period`           |
//! | `LOGSPOOL_FLUSH_COUNT`     | `flush_queue_item_count` |

use crate::Level;
use crate::console_sink::ConsoleTarget;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PATH: &str = "logspool.log";
pub const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_secs(2);
pub const DEFAULT_FLUSH_QUEUE_ITEM_COUNT: usize = 50;

pub const ENV_LEVEL: &str = "LOGSPOOL_LEVEL";
pub const ENV_PATH: &str = "LOGSPOOL_PATH";
pub const ENV_FLUSH_PERIOD_MS: &str = "LOGSPOOL_FLUSH_PERIOD_MS";
pub const ENV_FLUSH_COUNT: &str = "LOGSPOOL_FLUSH_COUNT";

/// Settings fixed when a logger is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Records below this level are discarded before they are queued.
    pub level: Level,
    /// File the durable sink appends to.
    pub path: PathBuf,
    /// Longest a queued record waits before the writer drains the queue.
    pub flush_period: Duration,
    /// Queue length that triggers an immediate drain. Producers block while the
    /// queue holds this many records.
    pub flush_queue_item_count: usize,
    /// Write the initialization block before the first record.
    pub startup_banner: bool,
    /// Longer messages are truncated to this many bytes.
    pub max_message_bytes: Option<usize>,
    pub console: ConsoleTarget,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::default(),
            path: PathBuf::from(DEFAULT_PATH),
            flush_period: DEFAULT_FLUSH_PERIOD,
            flush_queue_item_count: DEFAULT_FLUSH_QUEUE_ITEM_COUNT,
            startup_banner: true,
            max_message_bytes: None,
            console: ConsoleTarget::default(),
        }
    }
}

impl LoggerConfig {
    pub fn new(level: Level, path: impl AsRef<Path>) -> Self {
        Self {
            level,
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_flush_period(mut self, flush_period: Duration) -> Self {
        self.flush_period = flush_period;
        self
    }

    pub fn with_flush_queue_item_count(mut self, count: usize) -> Self {
        self.flush_queue_item_count = count;
        self
    }

    pub fn with_startup_banner(mut self, startup_banner: bool) -> Self {
        self.startup_banner = startup_banner;
        self
    }

    pub fn with_max_message_bytes(mut self, max_message_bytes: usize) -> Self {
        self.max_message_bytes = Some(max_message_bytes);
        self
    }

    pub fn with_console(mut self, console: ConsoleTarget) -> Self {
        self.console = console;
        self
    }

    /// The queue length at which producers block. Equal to the flush count.
    pub fn high_water_mark(&self) -> usize {
        self.flush_queue_item_count
    }

    /// Checks the values that would stall the writer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_queue_item_count == 0 {
            return Err(ConfigError::ZeroFlushCount);
        }
        if self.flush_period.is_zero() {
            return Err(ConfigError::ZeroFlushPeriod);
        }
        Ok(())
    }

    /// Replaces invalid values with their defaults, returning what was wrong.
    pub(crate) fn sanitized(mut self) -> (Self, Vec<ConfigError>) {
        let mut problems = Vec::new();
        if self.flush_queue_item_count == 0 {
            problems.push(ConfigError::ZeroFlushCount);
            self.flush_queue_item_count = DEFAULT_FLUSH_QUEUE_ITEM_COUNT;
        }
        if self.flush_period.is_zero() {
            problems.push(ConfigError::ZeroFlushPeriod);
            self.flush_period = DEFAULT_FLUSH_PERIOD;
        }
        (self, problems)
    }

    /// Defaults overlaid with the `LOGSPOOL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let invalid = |var: &'static str, value: &str| ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        };
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_LEVEL) {
            config.level = value.parse().map_err(|_| invalid(ENV_LEVEL, &value))?;
        }
        if let Some(value) = lookup(ENV_PATH) {
            config.path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_FLUSH_PERIOD_MS) {
            let ms: u64 = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_FLUSH_PERIOD_MS, &value))?;
            config.flush_period = Duration::from_millis(ms);
        }
        if let Some(value) = lookup(ENV_FLUSH_COUNT) {
            config.flush_queue_item_count = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_FLUSH_COUNT, &value))?;
        }
        config.validate()?;
        Ok(config)
    }
}
