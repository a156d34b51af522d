#![forbid(unsafe_code)]

//! Trailing-edge debouncing for deferred, idempotent work.
//!
//! Embedded content tends to report several size changes in quick succession
//! while it loads. Rather than recomputing layout on each report, callers
//! [`schedule`](Debouncer::schedule) the work and [`poll`](Debouncer::poll)
//! on their tick. Each `schedule` pushes the deadline out by the configured
//! window, so a burst collapses into a single run once it goes quiet.
//!
//! # Usage
//!
//! ```
//! use slotgrid_core::Debouncer;
//! use web_time::{Duration, Instant};
//!
//! let mut debouncer = Debouncer::new(Duration::from_millis(100));
//! let t0 = Instant::now();
//!
//! debouncer.schedule(t0);
//! debouncer.schedule(t0 + Duration::from_millis(50));
//!
//! // Still inside the window of the second schedule.
//! assert!(!debouncer.poll(t0 + Duration::from_millis(120)));
//! // Window elapsed: fires exactly once.
//! assert!(debouncer.poll(t0 + Duration::from_millis(150)));
//! assert!(!debouncer.poll(t0 + Duration::from_millis(500)));
//! ```
//!
//! # Thread Safety
//!
//! `Debouncer` is plain data and is meant to live inside a single-threaded
//! event loop.

use web_time::{Duration, Instant};

/// Deadline-based dirty flag.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Mark work as due once `window` has passed without another schedule.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Return `true` (and clear the flag) if pending work is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether work is scheduled but not yet polled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Instant at which pending work becomes due, for hosts that arm timers.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drop any pending work.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
