/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Time budget and cooperative cancellation.
//!
//! Heuristics poll [`Budget::check`] once per scored partition; nothing here
//! blocks or interrupts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shareable flag for cancelling a running search from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the search stops at its next check.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`Self::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Why a heuristic stopped before finishing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `max_time` elapsed.
    TimedOut,
    /// The [`CancelToken`] fired.
    Cancelled,
}

/// Deadline plus cancellation token for one run.
#[derive(Clone, Debug)]
pub struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl Budget {
    /// Start the clock now.
    pub fn new(max_time: Option<Duration>, cancel: CancelToken) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: max_time.map(|d| started + d),
            cancel,
        }
    }

    /// `Some(reason)` once the run must stop.
    #[inline]
    pub fn check(&self) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(StopReason::TimedOut),
            _ => None,
        }
    }

    /// Time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_budget_never_stops() {
        let b = Budget::new(None, CancelToken::new());
        assert_eq!(b.check(), None);
    }

    #[test]
    fn zero_budget_times_out() {
        let b = Budget::new(Some(Duration::ZERO), CancelToken::new());
        assert_eq!(b.check(), Some(StopReason::TimedOut));
    }

    #[test]
    fn cancel_wins_over_deadline() {
        let token = CancelToken::new();
        let b = Budget::new(Some(Duration::ZERO), token.clone());
        token.cancel();
        assert_eq!(b.check(), Some(StopReason::Cancelled));
        token.reset();
        assert!(!token.is_cancelled());
    }
}
