//! Monotonic tokens for download file names.
//!
//! Tokens are millisecond timestamps bumped past the previous token, so two
//! attempts in the same millisecond (or after a clock step backwards) still
//! get distinct file names.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of strictly increasing sequence tokens.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    last: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next token, strictly greater than every previous one.
    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.next_at(now)
    }

    fn next_at(&self, now: u64) -> u64 {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}
