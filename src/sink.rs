// SPDX-License-Identifier: MIT OR Apache-2.0
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;

/**
A destination for formatted log lines.

A sink is only ever used by one thread at a time. The file sink belongs to the
writer thread; the console sink sits behind a mutex shared by the writer and the
direct-write paths. Implementations need `Send` but no internal locking.
*/
pub trait Sink: Debug + Send {
    /**
    Writes one line. The implementation appends the line terminator.
    */
    fn write_line(&mut self, line: &str) -> std::io::Result<()>;

    /**
    Pushes everything written so far to the underlying device.

    The writer calls this once per flush cycle, after the last line of the cycle.
    */
    fn flush(&mut self) -> std::io::Result<()>;

    /**
    Drops any bytes buffered but not yet written to the device.

    Called after a failed write or flush, so a half-written line is not pushed out
    ahead of the next cycle's lines. Unbuffered sinks have nothing to do.
    */
    fn discard_pending(&mut self) {}
}

/// The console sink, shared by the writer thread and direct writes.
pub(crate) type SharedSink = Arc<Mutex<Box<dyn Sink>>>;

pub(crate) fn shared(sink: Box<dyn Sink>) -> SharedSink {
    Arc::new(Mutex::new(sink))
}

/*
Boilerplate notes.

# Sink

Clone makes no sense for a file handle, and sinks are moved into the logger anyway.
PartialEq/Eq/Hash: no meaningful notion of equality between destinations.
Default: a file sink needs a path.
Sync is not required; sharing goes through a Mutex.
*/
