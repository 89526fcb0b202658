// SPDX-License-Identifier: MIT OR Apache-2.0

/**
Logs a `format!`-style message through an [`AsyncLogger`](crate::AsyncLogger).

The arguments are only rendered if the level passes the logger's threshold.

```rust
use logspool::{AsyncLogger, InMemorySink, Level, LoggerConfig};

let file = InMemorySink::new();
let logger = AsyncLogger::with_sinks(
    LoggerConfig::default().with_startup_banner(false),
    Box::new(InMemorySink::new()),
    Some(Box::new(file.clone())),
);
let (width, height, depth) = (640, 480, 3);
logspool::add_log!(logger, "importer", Level::Info, "image Width: {width}, Height: {height}, Depth: {depth}");
logger.shutdown();
assert!(file.drain_logs().contains("importer: image Width: 640, Height: 480, Depth: 3"));
```
*/
#[macro_export]
macro_rules! add_log {
    ($logger:expr, $caller:expr, $level:expr, $($arg:tt)+) => {
        $logger.add_log_fmt($caller, ::std::format_args!($($arg)+), $level)
    };
}
