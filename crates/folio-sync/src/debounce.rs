//! Cancellable debounce deadline.
//!
//! A `Debouncer` is one optional deadline. Arming it (re)sets the deadline to
//! `now + window`; cancelling clears it. [`Debouncer::fired`] resolves when
//! the deadline passes and never resolves while disarmed, so it drops
//! straight into a `select!` loop.
//!
//! Time comes from `tokio::time::Instant`. Under a paused runtime
//! (`#[tokio::test(start_paused = true)]`) the clock only moves when the test
//! advances it, which makes debounce timing exact and deterministic.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start a fresh window measured from now, replacing any earlier deadline.
    pub fn arm(&mut self) -> Instant {
        let deadline = Instant::now() + self.window;
        self.deadline = Some(deadline);
        deadline
    }

    /// Drop the deadline. Returns whether one was set.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the deadline has passed.
    pub fn is_due(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolve once the deadline passes. Pending forever while disarmed.
    ///
    /// Does not disarm; the caller cancels once it has acted.
    pub async fn fired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
