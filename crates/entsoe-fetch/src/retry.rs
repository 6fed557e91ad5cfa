//! Bounded retry on transient transport failures.

use std::future::Future;
use std::time::Duration;

use entsoe_types::{EntsoeError, Result};

use crate::{Clock, TransportError};

/// Fixed-delay retry policy.
///
/// Only transient transport failures are retried; HTTP error statuses never
/// reach this layer as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy making `attempts` total attempts (at least one).
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            delay,
        }
    }

    /// Returns the total number of attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `op` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::Transport`] with the last failure.
    pub async fn run<T, F, Fut>(&self, clock: &dyn Clock, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.transient && attempt < self.attempts => {
                    tracing::warn!(
                        attempt,
                        attempts = self.attempts,
                        error = %e,
                        "connection error, retrying in {:?}",
                        self.delay
                    );
                    clock.sleep(self.delay).await;
                }
                Err(e) => {
                    return Err(EntsoeError::Transport {
                        attempts: attempt,
                        message: e.message,
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::ZERO)
    }
}
