//! Retry configuration for provider calls.

use backon::ExponentialBuilder;
use std::time::Duration;

/// Exponential backoff settings for [`SmsRetryableProvider`](crate::SmsRetryableProvider).
///
/// ```rust
/// use sms_sessions::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_min_delay(Duration::from_millis(200))
///     .with_max_retries(2);
/// assert_eq!(config.max_retries, 2);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry (default: 500 ms).
    pub min_delay: Duration,
    /// Upper bound of a single delay (default: 4 seconds).
    pub max_delay: Duration,
    /// Backoff factor (default: 2.0).
    pub factor: f32,
    /// Retries after the first attempt (default: 2).
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            factor: 2.0,
            max_retries: 2,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn disabled() -> Self {
        Self::default().with_max_retries(0)
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Build a backoff strategy from this configuration.
    pub fn build_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }

    /// Worst-case time spent sleeping between attempts.
    pub fn max_total_delay(&self) -> Duration {
        let mut total = Duration::ZERO;
        let mut delay = self.min_delay;
        for _ in 0..self.max_retries {
            total += delay.min(self.max_delay);
            delay = delay.mul_f32(self.factor);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_has_no_retries() {
        assert_eq!(RetryConfig::disabled().max_retries, 0);
        assert_eq!(RetryConfig::disabled().max_total_delay(), Duration::ZERO);
    }

    #[test]
    fn test_max_total_delay_is_capped() {
        let config = RetryConfig::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_factor(2.0)
            .with_max_retries(4);
        // 1 + 2 + 3 + 3
        assert_eq!(config.max_total_delay(), Duration::from_secs(9));
    }
}
