//! Progress throttling policy.
//!
//! Transfers report progress far more often than a dialog can usefully
//! redraw. The policy lets at most one update through per interval,
//! except for the terminal value, which always passes.

use std::time::Duration;
use tokio::time::Instant;

/// Percentage that bypasses the throttle.
pub const TERMINAL_PERCENT: u8 = 100;

/// Leading-edge rate limiter for UI-visible progress.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide whether `percent`, observed at `now`, should reach the UI.
    ///
    /// The first value of a window passes and opens the window; values
    /// inside an open window are held back. `100` always passes.
    pub fn should_emit(&mut self, percent: u8, now: Instant) -> bool {
        if percent >= TERMINAL_PERCENT {
            self.last_emit = Some(now);
            return true;
        }

        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }

    /// Forget the current window.
    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}
