use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);
/// Expired windows are swept after this many recorded failures.
const PRUNE_EVERY: u64 = 256;

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    recorded: AtomicU64,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            recorded: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a login attempt is allowed. Returns the seconds left in the
    /// window when the email is locked out. Does not count the attempt.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        self.check_at(email, Instant::now())
    }

    /// Record a failed login attempt for the given email.
    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Instant::now());
    }

    /// Forget the failures of an email after a successful login.
    pub fn reset(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }

    fn check_at(&self, email: &str, now: Instant) -> Result<(), u64> {
        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = *entry.value();

        if now.duration_since(start) > WINDOW || count < MAX_FAILURES {
            return Ok(());
        }

        let elapsed = now.duration_since(start).as_secs();
        Err(WINDOW.as_secs().saturating_sub(elapsed))
    }

    fn record_failure_at(&self, email: &str, now: Instant) {
        {
            let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
            let (count, start) = entry.value_mut();

            if now.duration_since(*start) > WINDOW {
                *count = 1;
                *start = now;
            } else {
                *count += 1;
            }
        }

        let recorded = self.recorded.fetch_add(1, Ordering::Relaxed) + 1;
        if recorded % PRUNE_EVERY == 0 {
            self.prune(now);
        }
    }

    /// Forget emails whose window has closed.
    fn prune(&self, now: Instant) {
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= WINDOW);
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
