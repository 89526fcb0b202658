// SPDX-License-Identifier: MIT OR Apache-2.0

//! The background writer thread.
//!
//! The writer owns the file sink for its whole life and shares the console sink with
//! the facade, which writes to it directly when the writer is not running. Each cycle
//! the writer waits for a drain trigger, swaps the queue into a local buffer, and
//! writes that buffer to the console and then the file, line by line, flushing both
//! at the end of the cycle. The console lock is held for the whole cycle.
//!
//! A failing sink never stops the loop. A file write error is reported on the console,
//! the rest of that cycle's records skip the file, and the file's unwritten buffer is
//! discarded so no torn line is flushed later. The next cycle tries the file again.

use crate::Level;
use crate::error::LogError;
use crate::log_record::LogRecord;
use crate::queue::SharedQueue;
use crate::sink::{SharedSink, Sink};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Caller tag on records the pipeline emits about itself.
pub const INTERNAL_CALLER: &str = "logspool";

pub(crate) const WRITER_THREAD_NAME: &str = "logspool-writer";

/// Counters shared between the writer and the facade.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) enqueued: AtomicU64,
    pub(crate) written: AtomicU64,
    pub(crate) flush_cycles: AtomicU64,
    pub(crate) sink_failures: AtomicU64,
}

/// The file sink, handed back when the writer thread exits so the caller can close it.
pub(crate) type FileHandle = Option<Box<dyn Sink>>;

#[derive(Debug)]
pub(crate) struct Writer {
    queue: Arc<SharedQueue>,
    console: SharedSink,
    file: FileHandle,
    flush_period: Duration,
    counters: Arc<Counters>,
    /// Written to both sinks before the first cycle.
    banner: Option<String>,
    /// Written to the console only before the first cycle.
    notices: Vec<LogRecord>,
}

/// Marks the queue closed however the writer thread exits, so producers blocked on
/// backpressure are released even if a sink panics.
struct CloseOnExit(Arc<SharedQueue>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl Writer {
    pub(crate) fn new(
        queue: Arc<SharedQueue>,
        console: SharedSink,
        file: FileHandle,
        flush_period: Duration,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            queue,
            console,
            file,
            flush_period,
            counters,
            banner: None,
            notices: Vec::new(),
        }
    }

    pub(crate) fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    pub(crate) fn with_notices(mut self, notices: Vec<LogRecord>) -> Self {
        self.notices = notices;
        self
    }

    /// Starts the writer loop on its own named thread.
    pub(crate) fn spawn(self) -> Result<JoinHandle<FileHandle>, LogError> {
        std::thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || self.run())
            .map_err(LogError::SpawnWriter)
    }

    fn run(mut self) -> FileHandle {
        let _close = CloseOnExit(self.queue.clone());
        self.write_preamble();

        let mut buffer = Vec::with_capacity(self.queue.flush_count());
        loop {
            let shutdown = self.queue.wait_and_swap(&mut buffer, self.flush_period);
            if !buffer.is_empty() {
                self.write_batch(&mut buffer);
            }
            if shutdown && self.queue.try_close() {
                break;
            }
        }
        self.file
    }

    fn write_preamble(&mut self) {
        let mut file_error = None;
        {
            let mut console = self.console.lock();
            if let Some(banner) = self.banner.take() {
                let _ = console.write_line(&banner);
                if let Some(file) = self.file.as_mut() {
                    if let Err(e) = file.write_line(&banner).and_then(|_| file.flush()) {
                        file.discard_pending();
                        file_error = Some(e);
                    }
                }
            }
            for notice in std::mem::take(&mut self.notices) {
                let _ = console.write_line(&notice.to_string());
            }
            let _ = console.flush();
        }
        if let Some(source) = file_error {
            self.report(LogError::Write { sink: "file", source }, 0);
        }
    }

    fn write_batch(&mut self, buffer: &mut Vec<LogRecord>) {
        let count = buffer.len();
        let mut console_error = None;
        let mut file_error = None;

        {
            let mut console = self.console.lock();
            for record in buffer.drain(..) {
                let line = record.to_string();
                if let Err(e) = console.write_line(&line) {
                    console_error.get_or_insert(e);
                }
                if let Some(file) = self.file.as_mut() {
                    if file_error.is_none() {
                        if let Err(e) = file.write_line(&line) {
                            file_error = Some(e);
                        }
                    }
                }
            }

            if let Err(e) = console.flush() {
                console_error.get_or_insert(e);
            }
        }
        if let Some(file) = self.file.as_mut() {
            if file_error.is_none() {
                if let Err(e) = file.flush() {
                    file_error = Some(e);
                }
            }
            if file_error.is_some() {
                // the buffer may end in a torn line; this cycle is lost to the file
                file.discard_pending();
            }
        }

        self.counters.written.fetch_add(count as u64, Ordering::Relaxed);
        self.counters.flush_cycles.fetch_add(1, Ordering::Relaxed);

        if let Some(source) = file_error {
            self.report(LogError::Write { sink: "file", source }, count);
        }
        if console_error.is_some() {
            // nowhere left to report it
            self.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Reports a failure on the console, the only sink left to trust.
    fn report(&mut self, error: LogError, lost: usize) {
        self.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
        let message = if lost > 0 {
            format!("{error}; up to {lost} records not written to the log file")
        } else {
            error.to_string()
        };
        let record = LogRecord::now(Level::Error, INTERNAL_CALLER, message);
        let mut console = self.console.lock();
        let _ = console.write_line(&record.to_string());
        let _ = console.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory_sink::InMemorySink;
    use crate::sink::shared;

    fn spawn_writer(
        flush_count: usize,
        flush_period: Duration,
    ) -> (Arc<SharedQueue>, InMemorySink, InMemorySink, Arc<Counters>, JoinHandle<FileHandle>) {
        let queue = Arc::new(SharedQueue::new(flush_count));
        let console = InMemorySink::new();
        let file = InMemorySink::new();
        let counters = Arc::new(Counters::default());
        let handle = Writer::new(
            queue.clone(),
            shared(Box::new(console.clone())),
            Some(Box::new(file.clone())),
            flush_period,
            counters.clone(),
        )
        .spawn()
        .unwrap();
        (queue, console, file, counters, handle)
    }

    #[test]
    fn writer_thread_is_named() {
        let (queue, _console, _file, _counters, handle) = spawn_writer(4, Duration::from_millis(10));
        assert_eq!(handle.thread().name(), Some(WRITER_THREAD_NAME));
        queue.request_shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn drains_everything_before_exit() {
        let (queue, console, file, counters, handle) = spawn_writer(4, Duration::from_secs(60));
        for i in 0..10 {
            queue.push(LogRecord::now(Level::Info, "t", format!("m{i}"))).unwrap();
        }
        queue.request_shutdown();
        handle.join().unwrap();

        assert_eq!(file.len(), 10);
        assert_eq!(console.len(), 10);
        assert_eq!(counters.written.load(Ordering::Relaxed), 10);
        assert!(queue.push(LogRecord::now(Level::Info, "t", "late")).is_err());
    }

    #[test]
    fn file_failure_is_reported_and_loop_continues() {
        let (queue, console, file, counters, handle) = spawn_writer(1, Duration::from_millis(20));
        file.set_failing(true);
        queue.push(LogRecord::now(Level::Info, "t", "lost")).unwrap();
        std::thread::sleep(Duration::from_millis(200));
        file.set_failing(false);
        queue.push(LogRecord::now(Level::Info, "t", "kept")).unwrap();
        queue.request_shutdown();
        handle.join().unwrap();

        let console_lines = console.lines();
        assert!(console_lines.iter().any(|l| l.ends_with("t: lost")));
        assert!(console_lines.iter().any(|l| l.contains("[ERROR] logspool: write to file sink failed")));
        let file_lines = file.lines();
        assert_eq!(file_lines.len(), 1);
        assert!(file_lines[0].ends_with("t: kept"));
        assert!(counters.sink_failures.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn banner_precedes_records_and_notices_stay_on_console() {
        let queue = Arc::new(SharedQueue::new(8));
        let console = InMemorySink::new();
        let file = InMemorySink::new();
        let notice = LogRecord::now(Level::Warning, INTERNAL_CALLER, "config fixed");
        let handle = Writer::new(
            queue.clone(),
            shared(Box::new(console.clone())),
            Some(Box::new(file.clone())),
            Duration::from_secs(60),
            Arc::default(),
        )
        .with_banner(Some("BANNER".to_string()))
        .with_notices(vec![notice])
        .spawn()
        .unwrap();
        queue.push(LogRecord::now(Level::Info, "t", "first")).unwrap();
        queue.request_shutdown();
        handle.join().unwrap();

        let file_lines = file.lines();
        assert_eq!(file_lines[0], "BANNER");
        assert!(file_lines[1].ends_with("t: first"));
        assert_eq!(file_lines.len(), 2);
        let console_lines = console.lines();
        assert_eq!(console_lines[0], "BANNER");
        assert!(console_lines[1].contains("config fixed"));
    }

    /// Fails the nth write and remembers what was buffered when `discard_pending` ran.
    #[derive(Debug, Default)]
    struct TornSink {
        writes: usize,
        fail_on: usize,
        pending: Vec<String>,
        flushed: Arc<parking_lot::Mutex<Vec<String>>>,
        discards: Arc<AtomicU64>,
    }

    impl Sink for TornSink {
        fn write_line(&mut self, line: &str) -> std::io::Result<()> {
            self.writes += 1;
            if self.writes == self.fail_on {
                // half the line made it into the buffer
                self.pending.push(line[..line.len() / 2].to_string());
                return Err(std::io::Error::other("disk full"));
            }
            self.pending.push(line.to_string());
            Ok(())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.lock().append(&mut self.pending);
            Ok(())
        }

        fn discard_pending(&mut self) {
            self.discards.fetch_add(1, Ordering::Relaxed);
            self.pending.clear();
        }
    }

    #[test]
    fn failed_write_discards_the_partial_line() {
        let queue = Arc::new(SharedQueue::new(2));
        let console = InMemorySink::new();
        let flushed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let discards = Arc::new(AtomicU64::new(0));
        let file = TornSink {
            fail_on: 2,
            flushed: flushed.clone(),
            discards: discards.clone(),
            ..TornSink::default()
        };
        let handle = Writer::new(
            queue.clone(),
            shared(Box::new(console.clone())),
            Some(Box::new(file)),
            Duration::from_secs(60),
            Arc::default(),
        )
        .spawn()
        .unwrap();

        queue.push(LogRecord::now(Level::Info, "t", "one")).unwrap();
        queue.push(LogRecord::now(Level::Info, "t", "two")).unwrap();
        // two records, the failure report
        wait_for(|| console.len() >= 3);
        queue.push(LogRecord::now(Level::Info, "t", "three")).unwrap();
        queue.request_shutdown();
        handle.join().unwrap();

        assert_eq!(discards.load(Ordering::Relaxed), 1);
        let flushed = flushed.lock();
        assert_eq!(flushed.len(), 1, "{flushed:?}");
        assert!(flushed[0].ends_with("t: three"));
        let console_lines = console.lines();
        assert_eq!(console_lines.len(), 4);
        assert!(console_lines[2].contains("up to 2 records not written"));
    }

    fn wait_for(condition: impl Fn() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(std::time::Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn returns_the_file_sink_on_exit() {
        let (queue, _console, _file, _counters, handle) = spawn_writer(4, Duration::from_millis(10));
        queue.request_shutdown();
        assert!(handle.join().unwrap().is_some());
    }
}
