// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logger producers talk to.
//!
//! [`AsyncLogger`] filters by level, renders a [`LogRecord`], and hands it to the
//! shared queue. The writer thread started by the constructor does all the I/O.
//!
//! # Lifecycle
//!
//! 1. **Construction**: the configuration is frozen, the log file is opened for
//!    appending and the writer thread is started.
//! 2. **Logging**: any number of threads call [`add_log`](AsyncLogger::add_log).
//!    Calls block only while the queue is at its high-water mark.
//! 3. **Shutdown**: [`shutdown`](AsyncLogger::shutdown) (or drop) queues a final
//!    record, wakes the writer, waits until it has drained every record and exited,
//!    then closes the log file.
//!
//! # Degraded modes
//!
//! Nothing here fails from the producer's point of view:
//!
//! - If the log file cannot be opened, the problem is reported on the console and
//!   the logger keeps running console-only.
//! - If the writer thread cannot be started, the logger runs in direct mode and
//!   writes each record to the console synchronously.
//! - Records submitted after shutdown are written to the console synchronously.

use crate::config::LoggerConfig;
use crate::console_sink::ConsoleSink;
use crate::error::LogError;
use crate::file_sink::FileSink;
use crate::log_record::{LogRecord, truncate_message};
use crate::queue::SharedQueue;
use crate::sink::{SharedSink, Sink, shared};
use crate::writer::{Counters, FileHandle, INTERNAL_CALLER, Writer};
use crate::{Level, sys};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::SystemTime;

/// Caller tag on the record queued by [`AsyncLogger::shutdown`].
pub const SHUTDOWN_CALLER: &str = "Logger";
pub const SHUTDOWN_MESSAGE: &str = "Logger shutting down...";

/// Counters describing what a logger has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Records accepted into the queue.
    pub enqueued: u64,
    /// Records handed to the console sink, by the writer or directly.
    pub written: u64,
    /// Completed writer drains that carried at least one record.
    pub flush_cycles: u64,
    /// Records currently waiting in the queue.
    pub queued: usize,
    /// Longest the queue has been.
    pub peak_queue_len: usize,
    /// Write or flush failures on either sink.
    pub sink_failures: u64,
}

#[derive(Debug)]
enum Mode {
    Buffered {
        queue: Arc<SharedQueue>,
        writer: Mutex<Option<JoinHandle<FileHandle>>>,
    },
    Direct,
}

/**
A buffered logger with a dedicated writer thread.

Every record that passes the level filter is written exactly once to the console
and, when one is open, to the log file. Records from one thread keep their order.

# Example

```rust
use logspool::{AsyncLogger, Level, LoggerConfig};
# let dir = tempfile::tempdir().unwrap();
# let path = dir.path().join("app.log");

let logger = AsyncLogger::new(LoggerConfig::new(Level::Debug, &path).with_startup_banner(false));
logger.add_log("main", "info message", Level::Info);
logger.add_log("main", "debug message", Level::Debug);
logger.shutdown();

let content = std::fs::read_to_string(&path).unwrap();
assert!(content.contains("[DEBUG] main: debug message"));
```
*/
#[derive(Debug)]
pub struct AsyncLogger {
    level: Level,
    path: PathBuf,
    max_message_bytes: Option<usize>,
    mode: Mode,
    /// Shared with the writer thread; written directly in direct mode and once the
    /// queue is closed.
    console: SharedSink,
    counters: Arc<Counters>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived
// - Clone: NOT implemented - the logger owns a thread; share it with Arc
// - PartialEq/Eq/Hash: NOT implemented - no meaningful equality between loggers
// - Default: NOT implemented - construction opens a file and spawns a thread,
//   which should be explicit. Use AsyncLogger::new(LoggerConfig::default()).
// - Drop: shuts down, draining every queued record
// - Send/Sync: automatic, required for sharing across producer threads

impl AsyncLogger {
    /**
    Creates a logger writing to the console and to the file at `config.path`.
    */
    pub fn new(config: LoggerConfig) -> Self {
        let console = Box::new(ConsoleSink::new(config.console));
        Self::with_console(config, console)
    }

    /**
    Like [`new`](Self::new), with a caller-provided console sink.

    The log file is still opened at `config.path`. If that fails, the reason is
    written to `console` before any record and the logger runs console-only.
    */
    pub fn with_console(config: LoggerConfig, console: Box<dyn Sink>) -> Self {
        Self::open(config, console, Vec::new())
    }

    /// Opens the log file and starts the writer. `notices` go to the console first.
    pub(crate) fn open(config: LoggerConfig, console: Box<dyn Sink>, mut notices: Vec<LogRecord>) -> Self {
        let (config, config_notices) = sanitize(config);
        notices.extend(config_notices);
        let file: FileHandle = match FileSink::open(&config.path) {
            Ok(file) => Some(Box::new(file)),
            Err(e) => {
                notices.push(LogRecord::now(
                    Level::Error,
                    INTERNAL_CALLER,
                    format!("{e}; logging to the console only"),
                ));
                None
            }
        };
        Self::start(config, console, file, notices)
    }

    /**
    Creates a logger with caller-provided sinks.

    `config.path` is only used for the startup banner. Pass `None` for `file` to
    log to the console alone.
    */
    pub fn with_sinks(config: LoggerConfig, console: Box<dyn Sink>, file: Option<Box<dyn Sink>>) -> Self {
        let (config, notices) = sanitize(config);
        Self::start(config, console, file, notices)
    }

    /**
    Creates an unbuffered logger that writes each record to `console` on the
    calling thread.

    This is the mode a logger falls back to when its writer thread cannot be started.
    */
    pub fn direct(config: LoggerConfig, console: Box<dyn Sink>) -> Self {
        let (config, _) = sanitize(config);
        Self::from_parts(&config, Mode::Direct, shared(console), Arc::default())
    }

    fn from_parts(config: &LoggerConfig, mode: Mode, console: SharedSink, counters: Arc<Counters>) -> Self {
        Self {
            level: config.level,
            path: config.path.clone(),
            max_message_bytes: config.max_message_bytes,
            mode,
            console,
            counters,
        }
    }

    fn start(config: LoggerConfig, console: Box<dyn Sink>, file: FileHandle, notices: Vec<LogRecord>) -> Self {
        let console = shared(console);
        let queue = Arc::new(SharedQueue::new(config.flush_queue_item_count));
        let counters = Arc::new(Counters::default());
        let banner = config.startup_banner.then(|| banner(&config));
        let writer = Writer::new(
            queue.clone(),
            console.clone(),
            file,
            config.flush_period,
            counters.clone(),
        )
        .with_banner(banner)
        .with_notices(notices.clone());

        match writer.spawn() {
            Ok(handle) => {
                let mode = Mode::Buffered {
                    queue,
                    writer: Mutex::new(Some(handle)),
                };
                Self::from_parts(&config, mode, console, counters)
            }
            Err(e) => Self::degraded(&config, console, e, notices),
        }
    }

    /// Direct mode on the console the writer would have used, after reporting why.
    fn degraded(config: &LoggerConfig, console: SharedSink, error: LogError, notices: Vec<LogRecord>) -> Self {
        let logger = Self::from_parts(config, Mode::Direct, console, Arc::default());
        for notice in &notices {
            logger.write_direct(notice);
        }
        logger.write_direct(&LogRecord::now(
            Level::Error,
            INTERNAL_CALLER,
            format!("{error}; writing unbuffered to the console"),
        ));
        logger
    }

    /// The level threshold fixed at construction.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The destination path fixed at construction.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `false` when the logger fell back to unbuffered console output.
    pub fn is_buffered(&self) -> bool {
        matches!(self.mode, Mode::Buffered { .. })
    }

    /// Whether a record at `level` would be kept.
    #[inline]
    pub fn log_enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /**
    Queues a log line.

    Does nothing if `level` is below the threshold. Otherwise blocks only while the
    queue is at its high-water mark. Never fails and never drops the record.
    */
    pub fn add_log(&self, caller: &str, message: impl Into<String>, level: Level) {
        if !self.log_enabled(level) {
            return;
        }
        let record = self.make_record(level, caller, message.into());
        self.dispatch(record);
    }

    /// [`add_log`](Self::add_log) at [`Level::Info`].
    pub fn info(&self, caller: &str, message: impl Into<String>) {
        self.add_log(caller, message, Level::Info);
    }

    /**
    Queues a preformatted message. The arguments are only rendered when `level`
    passes the filter. See also the [`add_log!`](crate::add_log) macro.
    */
    pub fn add_log_fmt(&self, caller: &str, message: fmt::Arguments<'_>, level: Level) {
        if !self.log_enabled(level) {
            return;
        }
        let record = self.make_record(level, caller, message.to_string());
        self.dispatch(record);
    }

    /**
    Async variant of [`add_log`](Self::add_log).

    While the queue is at its high-water mark the returned future is pending instead
    of blocking the executor thread; the writer wakes it after the next drain.
    */
    pub async fn add_log_async(&self, caller: &str, message: impl Into<String>, level: Level) {
        if !self.log_enabled(level) {
            return;
        }
        let record = self.make_record(level, caller, message.into());
        match &self.mode {
            Mode::Buffered { queue, .. } => match queue.push_async(record).await {
                Ok(()) => {
                    self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                }
                Err(record) => self.write_direct(&record),
            },
            Mode::Direct => self.write_direct(&record),
        }
    }

    fn make_record(&self, level: Level, caller: &str, message: String) -> LogRecord {
        let message = match self.max_message_bytes {
            Some(max) => truncate_message(message, max),
            None => message,
        };
        LogRecord::now(level, caller, message)
    }

    fn dispatch(&self, record: LogRecord) {
        match &self.mode {
            Mode::Buffered { queue, .. } => match queue.push(record) {
                Ok(()) => {
                    self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                }
                Err(record) => self.write_direct(&record),
            },
            Mode::Direct => self.write_direct(&record),
        }
    }

    fn write_direct(&self, record: &LogRecord) {
        let line = record.to_string();
        let mut console = self.console.lock();
        match console.write_line(&line).and_then(|_| console.flush()) {
            Ok(()) => self.counters.written.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.counters.sink_failures.fetch_add(1, Ordering::Relaxed),
        };
    }

    /**
    Drains every queued record, stops the writer, and closes the log file.

    Blocks until the writer thread has exited. Calling it again, concurrently or
    later, is harmless. Records submitted afterwards go straight to the console.
    */
    pub fn shutdown(&self) {
        let Mode::Buffered { queue, writer } = &self.mode else {
            let _ = self.console.lock().flush();
            return;
        };
        // held until the writer has exited, so concurrent callers also wait
        let mut writer = writer.lock();
        let Some(handle) = writer.take() else {
            return;
        };

        self.add_log(SHUTDOWN_CALLER, SHUTDOWN_MESSAGE, Level::Info);
        queue.request_shutdown();

        // dropping the returned file sink closes the log file
        drop(handle.join());

        // only non-empty if the writer died early
        for record in queue.take_remaining() {
            self.write_direct(&record);
        }
    }

    pub fn stats(&self) -> Stats {
        let (queued, peak_queue_len) = match &self.mode {
            Mode::Buffered { queue, .. } => {
                let snapshot = queue.snapshot();
                (snapshot.len, snapshot.peak_len)
            }
            Mode::Direct => (0, 0),
        };
        Stats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            written: self.counters.written.load(Ordering::Relaxed),
            flush_cycles: self.counters.flush_cycles.load(Ordering::Relaxed),
            queued,
            peak_queue_len,
            sink_failures: self.counters.sink_failures.load(Ordering::Relaxed),
        }
    }
}

impl Drop for AsyncLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sanitize(config: LoggerConfig) -> (LoggerConfig, Vec<LogRecord>) {
    let (config, problems) = config.sanitized();
    let notices = problems
        .into_iter()
        .map(|problem| {
            LogRecord::now(
                Level::Warning,
                INTERNAL_CALLER,
                format!("invalid configuration: {problem}; using the default"),
            )
        })
        .collect();
    (config, notices)
}

fn banner(config: &LoggerConfig) -> String {
    let path = std::path::absolute(&config.path).unwrap_or_else(|_| config.path.clone());
    format!(
        "{}\nLogger initialization...\n\tLevel: {}\n\tDate: {}\n\tLogPath: {}",
        "*".repeat(80),
        config.level,
        sys::format_date_time(SystemTime::now()),
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory_sink::InMemorySink;
    use std::time::Duration;

    fn quiet(level: Level) -> LoggerConfig {
        LoggerConfig::default()
            .with_level(level)
            .with_startup_banner(false)
    }

    fn logger(config: LoggerConfig) -> (AsyncLogger, InMemorySink, InMemorySink) {
        let console = InMemorySink::new();
        let file = InMemorySink::new();
        let logger = AsyncLogger::with_sinks(
            config,
            Box::new(console.clone()),
            Some(Box::new(file.clone())),
        );
        (logger, console, file)
    }

    #[test]
    fn filtered_records_are_never_queued() {
        let (logger, _console, file) = logger(quiet(Level::Warning));
        logger.add_log("x", "debug", Level::Debug);
        logger.add_log("x", "info", Level::Info);
        logger.add_log("x", "warning", Level::Warning);
        logger.add_log("x", "error", Level::Error);
        assert_eq!(logger.stats().enqueued, 2);
        logger.shutdown();

        let lines = file.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].ends_with("[WARNING] x: warning"));
        assert!(lines[1].ends_with("[ERROR] x: error"));
    }

    #[test]
    fn shutdown_record_is_written_last() {
        let (logger, console, file) = logger(quiet(Level::Info));
        logger.info("main", "hello");
        logger.shutdown();
        let lines = file.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("[INFO] Logger: Logger shutting down..."));
        assert_eq!(console.lines(), lines);
    }

    #[test]
    fn shutdown_is_idempotent_and_later_records_reach_console() {
        let (logger, console, file) = logger(quiet(Level::Info));
        logger.shutdown();
        logger.shutdown();
        logger.add_log("late", "after shutdown", Level::Error);

        assert_eq!(file.len(), 1);
        let console_lines = console.lines();
        assert_eq!(console_lines.len(), 2);
        assert!(console_lines[1].ends_with("[ERROR] late: after shutdown"));
    }

    #[test]
    fn format_overload_renders_arguments() {
        let (logger, _console, file) = logger(quiet(Level::Debug));
        let (width, height) = (640, 480);
        logger.add_log_fmt(
            "importer",
            format_args!("image Width: {width}, Height: {height}"),
            Level::Info,
        );
        logger.shutdown();
        assert!(file.lines()[0].ends_with("[INFO] importer: image Width: 640, Height: 480"));
    }

    #[test]
    fn long_messages_are_capped() {
        let (logger, _console, file) = logger(quiet(Level::Info).with_max_message_bytes(4));
        logger.info("c", "abcdefgh");
        logger.shutdown();
        assert!(file.lines()[0].ends_with("c: abcd…"));
    }

    #[test]
    fn invalid_config_is_reported_and_replaced() {
        let config = quiet(Level::Info).with_flush_queue_item_count(0);
        let (logger, console, file) = logger(config);
        logger.info("c", "still works");
        logger.shutdown();
        assert!(console.lines()[0].contains("invalid configuration"));
        assert!(!file.lines()[0].contains("invalid configuration"));
        assert!(file.lines()[0].ends_with("c: still works"));
    }

    #[test]
    fn direct_mode_writes_synchronously() {
        let console = InMemorySink::new();
        let logger = AsyncLogger::direct(quiet(Level::Info), Box::new(console.clone()));
        assert!(!logger.is_buffered());
        logger.add_log("d", "now", Level::Warning);
        logger.add_log("d", "filtered", Level::Debug);
        assert_eq!(console.len(), 1);
        assert!(console.lines()[0].ends_with("[WARNING] d: now"));
        assert_eq!(logger.stats().written, 1);
    }

    #[test]
    fn banner_describes_configuration() {
        let (logger, _console, file) = logger(
            LoggerConfig::new(Level::Warning, "banner-test.log").with_flush_period(Duration::from_millis(50)),
        );
        logger.shutdown();
        let content = file.drain_logs();
        assert!(content.starts_with(&"*".repeat(80)));
        assert!(content.contains("Logger initialization..."));
        assert!(content.contains("\tLevel: WARNING"));
        assert!(content.contains("banner-test.log"));
    }

    /// Accepts everything and takes its time to close.
    #[derive(Debug)]
    struct SlowCloseSink(Duration);

    impl Sink for SlowCloseSink {
        fn write_line(&mut self, _line: &str) -> std::io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Drop for SlowCloseSink {
        fn drop(&mut self) {
            std::thread::sleep(self.0);
        }
    }

    #[test]
    fn records_logged_while_the_file_closes_reach_the_same_console() {
        let console = InMemorySink::new();
        let logger = AsyncLogger::with_sinks(
            quiet(Level::Info),
            Box::new(console.clone()),
            Some(Box::new(SlowCloseSink(Duration::from_millis(500)))),
        );

        std::thread::scope(|scope| {
            scope.spawn(|| logger.shutdown());
            std::thread::sleep(Duration::from_millis(150));
            logger.add_log("late", "during teardown", Level::Error);
        });

        let lines = console.lines();
        assert!(
            lines.iter().any(|l| l.ends_with("[ERROR] late: during teardown")),
            "{lines:?}"
        );
        assert_eq!(logger.stats().sink_failures, 0);
    }

    #[test]
    fn spawn_failure_falls_back_to_the_given_console() {
        let console = InMemorySink::new();
        let notice = LogRecord::now(Level::Warning, INTERNAL_CALLER, "config fixed");
        let logger = AsyncLogger::degraded(
            &quiet(Level::Info),
            shared(Box::new(console.clone())),
            LogError::SpawnWriter(std::io::Error::other("no threads")),
            vec![notice],
        );
        assert!(!logger.is_buffered());
        logger.add_log("d", "after fallback", Level::Info);
        logger.shutdown();

        let lines = console.lines();
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert!(lines[0].ends_with("[WARNING] logspool: config fixed"));
        assert!(lines[1].contains("[ERROR] logspool: "));
        assert!(lines[1].contains("no threads"));
        assert!(lines[1].ends_with("writing unbuffered to the console"));
        assert!(lines[2].ends_with("[INFO] d: after fallback"));
    }
}
