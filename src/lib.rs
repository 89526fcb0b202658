//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# logspool

logspool is a buffered logger that keeps slow I/O off the threads that log.

# The problem

Writing a log line to a file and a terminal is slow compared to the work most threads
do between log calls. If every call performs its own write, logging dominates hot
paths, and concurrent writers contend on the same file.

logspool separates the two. Producers format a line and push it onto a shared queue.
One writer thread drains the queue and does all the writing.

# Guarantees

* **Lossless.** Every call that passes the level filter is written exactly once. A
  graceful [`shutdown`](AsyncLogger::shutdown) (or dropping the logger) waits until
  the queue is empty. Killing the process abruptly can lose what is still in memory.
* **Ordered.** Records from one thread appear in the order they were logged.
  Records from different threads appear in the order they reached the queue.
* **Bounded.** The queue never holds more than `flush_queue_item_count` records.
  Producers that find it full wait until the writer has drained it.
* **Timely.** The writer drains as soon as the queue reaches `flush_queue_item_count`,
  and at least once every `flush_period` otherwise.

# Output

Each record is written identically to the console and to the log file:

```text
18:33:54.208 [DEBUG] main: debug message
```

The time is local, with millisecond resolution.

# The API

```rust
use logspool::{AsyncLogger, Level, LoggerConfig};
use std::time::Duration;
# let dir = tempfile::tempdir().unwrap();
# let path = dir.path().join("app.log");

let config = LoggerConfig::new(Level::Debug, &path)
    .with_flush_period(Duration::from_secs(2))
    .with_flush_queue_item_count(20);
let logger = AsyncLogger::new(config);

logger.add_log("main", "info message", Level::Info);
logspool::add_log!(logger, "main", Level::Warning, "{} retries left", 3);
logger.shutdown();
```

Components that cannot be handed a logger can use the process-wide instance in
[`global_logger`].

# Failure handling

Logging never returns an error. If the log file cannot be opened the logger runs
console-only; if a write fails the failure is reported on the console and the
writer carries on; if the writer thread cannot be started the logger writes
synchronously to the console.
*/

mod async_logger;
mod config;
mod console_sink;
mod error;
mod file_sink;
pub mod global_logger;
mod inmemory_sink;
mod level;
mod log_record;
mod macros;
mod queue;
mod sink;
pub mod sys;
mod writer;

pub use async_logger::{AsyncLogger, SHUTDOWN_CALLER, SHUTDOWN_MESSAGE, Stats};
pub use config::{
    DEFAULT_FLUSH_PERIOD, DEFAULT_FLUSH_QUEUE_ITEM_COUNT, DEFAULT_PATH, ENV_FLUSH_COUNT,
    ENV_FLUSH_PERIOD_MS, ENV_LEVEL, ENV_PATH, LoggerConfig,
};
pub use console_sink::{ConsoleSink, ConsoleTarget};
pub use error::{ConfigError, LogError, ParseLevelError};
pub use file_sink::FileSink;
pub use inmemory_sink::InMemorySink;
pub use level::Level;
pub use log_record::LogRecord;
pub use sink::Sink;
pub use writer::INTERNAL_CALLER;
