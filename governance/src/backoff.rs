use config::RetryConfig;
use std::time::Duration;

/// Exponential backoff with additive uniform jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffSchedule {
    base: Duration,
    multiplier: f64,
    max_delay: Duration,
    max_jitter: Duration
}

impl BackoffSchedule {
    pub fn new(base: Duration, multiplier: f64, max_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            base,
            multiplier: multiplier.max(1.0),
            max_delay,
            max_jitter
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.base_delay(),
            config.backoff_multiplier,
            config.max_delay(),
            config.max_jitter()
        )
    }

    /// Delay before retry `retry` (0-indexed), without jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    /// Uniform in `[0, max_jitter)`.
    pub fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let nanos = self.max_jitter.as_nanos() as f64 * rand::random::<f64>();
        Duration::from_nanos(nanos as u64)
    }

    /// Full delay before retry `retry`, honouring a server-requested
    /// `Retry-After` (seconds) up to `max_delay + max_jitter`.
    pub fn delay(&self, retry: u32, retry_after: Option<u64>) -> Duration {
        let delay = self.base_delay(retry) + self.jitter();
        match retry_after {
            Some(secs) => delay
                .max(Duration::from_secs(secs))
                .min(self.max_delay + self.max_jitter),
            None => delay
        }
    }

    /// Sum of the jitter-free delays before the first `retries` retries.
    pub fn total_base_delay(&self, retries: u32) -> Duration {
        (0..retries).map(|retry| self.base_delay(retry)).sum()
    }
}
