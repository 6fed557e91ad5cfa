//! Request-window rate limiting with an injectable clock.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

/// Source of time for rate limiting and retry delays.
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Waits for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when slept on.
///
/// Sleeping advances time instantly, which makes rate-limit and retry behaviour
/// observable without waiting.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }

    /// Returns every duration slept so far.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the total time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}

/// Maximum number of requests allowed within a sliding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per period. Zero disables limiting.
    pub max_requests: usize,
    /// Length of the sliding window.
    pub period: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        // provider allows 400 per minute; keep a margin
        Self {
            max_requests: 375,
            period: Duration::from_secs(59),
        }
    }
}

impl RateLimit {
    /// Returns a limit that never blocks.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_requests: 0,
            period: Duration::ZERO,
        }
    }
}

/// Sliding-window limiter shared by all requests of one client.
///
/// The window is guarded by an async mutex, so concurrent callers queue up and
/// the limit holds across tasks.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    window: AsyncMutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            window: AsyncMutex::new(VecDeque::with_capacity(limit.max_requests)),
        }
    }

    /// Returns the configured limit.
    #[must_use]
    pub const fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Waits until one more request fits in the window, then records it.
    pub async fn acquire(&self, clock: &dyn Clock) {
        if self.limit.max_requests == 0 {
            return;
        }
        let mut window = self.window.lock().await;
        loop {
            let now = clock.now();
            while window
                .front()
                .is_some_and(|first| now.duration_since(*first) >= self.limit.period)
            {
                window.pop_front();
            }
            if window.len() < self.limit.max_requests {
                window.push_back(now);
                return;
            }
            let Some(first) = window.front().copied() else {
                continue;
            };
            let wait = self.limit.period.saturating_sub(now.duration_since(first));
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
            clock.sleep(wait).await;
        }
    }
}
