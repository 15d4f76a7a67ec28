//! Socket reconnection policy.

use std::time::Duration;

use crate::Config;

/// Exponential reconnect backoff with a cap and a bounded number of attempts.
///
/// The n-th failure (counting from one) waits `min(base * 2^(n-1), cap)` before the
/// next attempt, until `max_attempts` failures have been recorded.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl ReconnectPolicy {
    /// Create a policy
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            cap,
            max_attempts,
            attempts: 0,
        }
    }

    /// Create a policy from socket settings in config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.reconnect_base_delay,
            config.reconnect_max_delay,
            config.max_socket_attempts,
        )
    }

    /// failures recorded since last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// configured attempt limit
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Forget recorded failures, called when a connection opens
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Record a failure, returning the delay before next attempt, or `None` when exhausted.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.attempts = self.attempts.saturating_add(1).min(self.max_attempts);
        if self.attempts >= self.max_attempts {
            return None;
        }
        Some(self.delay_for(self.attempts))
    }

    /// Delay after the given failure count
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << shift)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}
