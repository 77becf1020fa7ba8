//! Sliding-window rate limiter
//!
//! Keeps the instants of the most recent requests and admits a new one only
//! when fewer than `ceiling` of them fall inside the trailing one-second
//! window. One limiter belongs to one client session; share it through an
//! `Arc` when several tasks issue requests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Requests per second allowed without an API key
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 3;

/// Requests per second allowed with an API key
pub const API_KEY_REQUESTS_PER_SECOND: u32 = 10;

const WINDOW: Duration = Duration::from_secs(1);

/// Admission control for outbound requests
#[derive(Debug)]
pub struct RateLimiter {
    ceiling: usize,
    recent: Mutex<VecDeque<Instant>>,
    acquired: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter admitting `requests_per_second` requests per second
    ///
    /// A ceiling of zero is treated as one.
    #[must_use]
    pub fn new(requests_per_second: u32) -> Self {
        let ceiling = usize::try_from(requests_per_second.max(1)).unwrap_or(usize::MAX);
        Self {
            ceiling,
            recent: Mutex::new(VecDeque::with_capacity(ceiling)),
            acquired: AtomicU64::new(0),
        }
    }

    /// Limiter for the NCBI policy: 10/s with an API key, 3/s without,
    /// unless `override_rate` is set
    #[must_use]
    pub fn for_policy(has_api_key: bool, override_rate: Option<u32>) -> Self {
        let rate = override_rate.unwrap_or(if has_api_key {
            API_KEY_REQUESTS_PER_SECOND
        } else {
            DEFAULT_REQUESTS_PER_SECOND
        });
        Self::new(rate)
    }

    /// Maximum requests admitted per second
    #[must_use]
    pub const fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Number of slots handed out since construction
    #[must_use]
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Wait until a request may be issued, then reserve the slot
    pub async fn acquire(&self) {
        loop {
            let wait = match self.try_reserve(Instant::now()) {
                None => return,
                Some(wait) => wait,
            };

            debug!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                ceiling = self.ceiling,
                "Rate limit reached, waiting"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Reserve a slot at `now`, or return how long until one frees up
    fn try_reserve(&self, now: Instant) -> Option<Duration> {
        let mut recent = self.recent.lock();

        while recent
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= WINDOW)
        {
            recent.pop_front();
        }

        if recent.len() < self.ceiling {
            recent.push_back(now);
            self.acquired.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        // Full window: the oldest entry is the next one to expire
        recent
            .front()
            .map(|oldest| (*oldest + WINDOW).saturating_duration_since(now))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_SECOND)
    }
}
