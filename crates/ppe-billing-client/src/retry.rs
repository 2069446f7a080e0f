//! Retry policy for charge requests.

use std::time::Duration;

/// Configuration for bounded retry with exponential backoff.
///
/// The charge endpoint is retried on transport errors and transient HTTP
/// statuses (429, 5xx); everything else is terminal.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first (default: 5).
    pub max_attempts: u32,

    /// Base delay for exponential backoff.
    pub base_delay: Duration,

    /// Cap on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Set the total attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the base backoff delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped at `max_delay`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        let delay_ms = (self.base_delay.as_millis() as u64).saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }
}
