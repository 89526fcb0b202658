// SPDX-License-Identifier: MIT OR Apache-2.0

//! The hand-off buffer between producers and the writer thread.
//!
//! # Synchronization
//!
//! One mutex guards the record vector and the lifecycle flags. Two condition
//! variables hang off it:
//!
//! - `not_full`: producers wait here while the queue holds `high_water_mark` records.
//! - `flush_ready`: the writer waits here, with a timeout of one flush period, until
//!   the queue holds `flush_count` records or shutdown was requested.
//!
//! Async producers cannot park on a condvar, so they leave a [`Waker`] in the state
//! instead. The writer wakes both kinds of waiter after every drain.
//!
//! The writer never holds the lock while writing. It swaps the whole record vector
//! with its own empty buffer, so the critical section is a pointer exchange
//! regardless of how many records are queued.
//!
//! # Lifecycle
//!
//! `shutdown` means the writer should drain and stop; producers are still admitted
//! so that nobody blocked at that moment loses a record. `closed` is set by the
//! writer once it observed shutdown with an empty queue. After that every push is
//! refused and handed back to the caller.

use crate::log_record::LogRecord;
use parking_lot::{Condvar, Mutex};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    records: Vec<LogRecord>,
    shutdown: bool,
    closed: bool,
    async_waiters: Vec<Waker>,
    peak_len: usize,
}

/// Point-in-time view of the queue, for [`Stats`](crate::Stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueSnapshot {
    pub(crate) len: usize,
    pub(crate) peak_len: usize,
}

#[derive(Debug)]
pub(crate) struct SharedQueue {
    state: Mutex<State>,
    not_full: Condvar,
    flush_ready: Condvar,
    high_water_mark: usize,
    flush_count: usize,
}

impl SharedQueue {
    /// `flush_count` is both the drain trigger and the backpressure bound.
    pub(crate) fn new(flush_count: usize) -> Self {
        let flush_count = flush_count.max(1);
        Self {
            state: Mutex::new(State {
                records: Vec::with_capacity(flush_count),
                ..State::default()
            }),
            not_full: Condvar::new(),
            flush_ready: Condvar::new(),
            high_water_mark: flush_count,
            flush_count,
        }
    }

    pub(crate) fn flush_count(&self) -> usize {
        self.flush_count
    }

    fn admit(&self, state: &mut State, record: LogRecord) {
        state.records.push(record);
        state.peak_len = state.peak_len.max(state.records.len());
        if state.records.len() >= self.flush_count {
            self.flush_ready.notify_one();
        }
    }

    /**
    Appends `record`, blocking while the queue is at its high-water mark.

    Returns the record if the writer has already closed the queue.
    */
    pub(crate) fn push(&self, record: LogRecord) -> Result<(), LogRecord> {
        let mut state = self.state.lock();
        self.not_full.wait_while(&mut state, |state| {
            state.records.len() >= self.high_water_mark && !state.closed
        });
        if state.closed {
            return Err(record);
        }
        self.admit(&mut state, record);
        Ok(())
    }

    /**
    Like [`push`](Self::push), but suspends the task instead of blocking the thread.
    */
    pub(crate) fn push_async(&self, record: LogRecord) -> Push<'_> {
        Push {
            queue: self,
            record: Some(record),
        }
    }

    /**
    Waits until a drain is due, then swaps the queued records into `buffer`.

    `buffer` must be empty; it keeps its capacity across cycles so the shared
    vector never reallocates after warm-up. Returns whether shutdown was requested.
    */
    pub(crate) fn wait_and_swap(&self, buffer: &mut Vec<LogRecord>, flush_period: Duration) -> bool {
        debug_assert!(buffer.is_empty());
        let mut state = self.state.lock();
        let _ = self.flush_ready.wait_while_for(
            &mut state,
            |state| state.records.len() < self.flush_count && !state.shutdown,
            flush_period,
        );
        std::mem::swap(&mut state.records, buffer);
        let shutdown = state.shutdown;
        let waiters = std::mem::take(&mut state.async_waiters);
        drop(state);

        self.not_full.notify_all();
        for waker in waiters {
            waker.wake();
        }
        shutdown
    }

    /// Asks the writer to drain everything and stop.
    pub(crate) fn request_shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        drop(state);
        self.flush_ready.notify_all();
    }

    /**
    Closes the queue if shutdown was requested and nothing is left to write.

    Returns `true` when the writer may exit.
    */
    pub(crate) fn try_close(&self) -> bool {
        let mut state = self.state.lock();
        if !(state.shutdown && state.records.is_empty()) {
            return false;
        }
        self.close_locked(&mut state);
        true
    }

    /// Closes unconditionally. Used when the writer exits abnormally.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        self.close_locked(&mut state);
    }

    fn close_locked(&self, state: &mut State) {
        if state.closed {
            return;
        }
        state.closed = true;
        for waker in state.async_waiters.drain(..) {
            waker.wake();
        }
        self.not_full.notify_all();
    }

    /// Removes whatever the writer left behind. Empty after a clean shutdown.
    pub(crate) fn take_remaining(&self) -> Vec<LogRecord> {
        std::mem::take(&mut self.state.lock().records)
    }

    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        QueueSnapshot {
            len: state.records.len(),
            peak_len: state.peak_len,
        }
    }
}

/// Future returned by [`SharedQueue::push_async`].
#[derive(Debug)]
pub(crate) struct Push<'a> {
    queue: &'a SharedQueue,
    record: Option<LogRecord>,
}

impl Future for Push<'_> {
    type Output = Result<(), LogRecord>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let queue = self.queue;
        let Some(record) = self.record.take() else {
            // already completed
            return Poll::Ready(Ok(()));
        };
        let mut state = queue.state.lock();
        if state.closed {
            return Poll::Ready(Err(record));
        }
        if state.records.len() < queue.high_water_mark {
            queue.admit(&mut state, record);
            return Poll::Ready(Ok(()));
        }
        if !state.async_waiters.iter().any(|w| w.will_wake(cx.waker())) {
            state.async_waiters.push(cx.waker().clone());
        }
        drop(state);
        self.record = Some(record);
        Poll::Pending
    }
}
