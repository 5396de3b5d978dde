//! Bounded, time-ordered request storage.
//!
//! The store is append-only at the tail and evicted from the head, so the
//! stored timestamps are non-decreasing at all times. Everything else in the
//! engine leans on that invariant: window queries scan from the tail and stop
//! at the first record outside the window, and eviction only ever drops a
//! prefix, so nothing newer than the deadline can be removed by accident.
//!
//! NOT thread safe; a single logical thread owns all mutation.

use crate::monitor::error::Error;
use crate::monitor::request::Request;
use chrono::{DateTime, FixedOffset, TimeDelta};
use std::collections::VecDeque;

/// Accumulates requests in event-time order.
#[derive(Debug, Default)]
pub struct Store {
    requests: VecDeque<Request>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request.
    ///
    /// Fails with [`Error::OutOfOrder`] if the request is strictly older than
    /// the newest stored request; equal timestamps are normal (several events
    /// per instant) and accepted. A rejected add leaves the store unchanged.
    pub fn add(&mut self, req: Request) -> Result<(), Error> {
        if let Some(last) = self.requests.back() {
            if req.time < last.time {
                return Err(Error::OutOfOrder {
                    got: req.time.to_rfc3339(),
                    last: last.time.to_rfc3339(),
                });
            }
        }

        self.requests.push_back(req);
        Ok(())
    }

    /// Iterates over the requests strictly newer than `deadline`, oldest
    /// first.
    ///
    /// The cutoff is located by scanning backwards from the tail, so the cost
    /// is proportional to the size of the answer, not the size of the store —
    /// callers always ask about the recent window.
    pub fn since(&self, deadline: DateTime<FixedOffset>) -> impl Iterator<Item = &Request> {
        let mut start = self.requests.len();
        while start > 0 && self.requests[start - 1].time > deadline {
            start -= 1;
        }
        self.requests.range(start..)
    }

    /// Drops every request with `time <= deadline`.
    ///
    /// Idempotent; a no-op when the deadline precedes everything stored.
    /// Evicted slots release their records immediately while the deque keeps
    /// its capacity for future appends.
    pub fn evict(&mut self, deadline: DateTime<FixedOffset>) {
        while let Some(front) = self.requests.front() {
            if front.time <= deadline {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Deadline for a window ending at `now`: `now - window`.
pub fn deadline(now: DateTime<FixedOffset>, window: TimeDelta) -> DateTime<FixedOffset> {
    now - window
}
