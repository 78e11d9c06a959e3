//! Failed-login throttling
//!
//! Counts failures per username inside a sliding window. Once the limit is
//! reached further attempts are refused until the oldest failure ages out.
//!
//! Entries live in a bounded `moka` cache whose time-to-live equals the
//! window, so a username that stops failing is dropped on its own.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;

/// Usernames tracked at once before the least recently used are evicted
pub const DEFAULT_MAX_TRACKED: u64 = 10_000;

/// Sliding-window login limiter
#[derive(Debug, Clone)]
pub struct LoginLimiter {
    max_failures: usize,
    window: Duration,
    failures: Cache<String, Arc<Vec<Instant>>>,
}

impl LoginLimiter {
    pub fn new(max_failures: usize, window: Duration) -> Self {
        Self::with_capacity(max_failures, window, DEFAULT_MAX_TRACKED)
    }

    pub fn with_capacity(max_failures: usize, window: Duration, max_tracked: u64) -> Self {
        let failures = Cache::builder()
            .max_capacity(max_tracked.max(1))
            .time_to_live(window)
            .build();
        Self {
            max_failures: max_failures.max(1),
            window,
            failures,
        }
    }

    /// `Err(wait)` when `username` is locked out.
    pub fn check(&self, username: &str) -> Result<(), Duration> {
        self.check_at(username, Instant::now())
    }

    pub fn record_failure(&self, username: &str) {
        self.record_failure_at(username, Instant::now());
    }

    /// Forget failures after a successful login.
    pub fn reset(&self, username: &str) {
        self.failures.invalidate(username);
    }

    /// Usernames currently tracked, after pending expirations run.
    pub fn tracked(&self) -> u64 {
        self.failures.run_pending_tasks();
        self.failures.entry_count()
    }

    fn check_at(&self, username: &str, now: Instant) -> Result<(), Duration> {
        let Some(times) = self.failures.get(username) else {
            return Ok(());
        };
        let recent: Vec<Instant> = times
            .iter()
            .copied()
            .filter(|t| now.saturating_duration_since(*t) < self.window)
            .collect();
        if recent.len() < self.max_failures {
            return Ok(());
        }
        let oldest = recent.iter().min().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    fn record_failure_at(&self, username: &str, now: Instant) {
        let window = self.window;
        // Re-inserting restarts the time-to-live from the latest failure.
        self.failures
            .entry(username.to_owned())
            .and_upsert_with(|existing| {
                let mut times: Vec<Instant> = existing
                    .map(|entry| entry.into_value())
                    .map(|times| {
                        times
                            .iter()
                            .copied()
                            .filter(|t| now.saturating_duration_since(*t) < window)
                            .collect()
                    })
                    .unwrap_or_default();
                times.push(now);
                Arc::new(times)
            });
    }
}
