//! Fixed-window request rate limiter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use super::clock::{Clock, SystemClock};

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Admits at most `max_requests` calls per fixed window.
///
/// The window is reset lazily: the first call at or after the window end
/// zeroes the count and starts a new window at that instant. An idle gap
/// followed by a burst therefore gets a full quota, and bursts straddling a
/// window boundary may reach twice the nominal rate. This is the intended
/// fixed-window behavior, not a sliding window.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum admissions per window
    max_requests: u32,
    /// Window length
    window: Duration,
    /// Count and window end, updated together
    state: Mutex<WindowState>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    window_end: Instant,
}

impl RateLimiter {
    /// Create a limiter with a one second window on the system clock.
    pub fn new(max_requests: u32) -> Self {
        Self::with_clock(max_requests, Arc::new(SystemClock))
    }

    /// Create a limiter with a one second window on the given clock.
    pub fn with_clock(max_requests: u32, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(max_requests, DEFAULT_WINDOW, clock)
    }

    /// Create a limiter with a custom window length.
    pub fn with_window(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let window_end = clock.now() + window;
        Self {
            max_requests,
            window,
            state: Mutex::new(WindowState { count: 0, window_end }),
            clock,
        }
    }

    /// Try to admit one request.
    ///
    /// Returns `true` if the request is within the quota, `false` otherwise.
    pub fn allow(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.maybe_reset_window(&mut state, now);

        if state.count < self.max_requests {
            state.count += 1;
            true
        } else {
            false
        }
    }

    /// Quota left in the current window.
    pub fn remaining(&self) -> u32 {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.maybe_reset_window(&mut state, now);
        self.max_requests.saturating_sub(state.count)
    }

    /// Get the configured quota.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Get the window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    fn maybe_reset_window(&self, state: &mut WindowState, now: Instant) {
        if now >= state.window_end {
            trace!(previous_count = state.count, "Rate limit window reset");
            state.count = 0;
            state.window_end = now + self.window;
        }
    }
}
