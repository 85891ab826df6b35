// Retry logic between job attempts
use crate::application::runner::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_RETRY_BASE_DELAY_MS, MAX_RETRY_DELAY_MS,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Run another attempt after the delay
    Retry(Duration),
    /// Attempts exhausted
    GiveUp,
}

/// Exponential backoff between attempts
///
/// delay = base_delay * (backoff_factor ^ (attempt - 1)) * jitter,
/// jitter in 0.9..=1.1 derived from the job name, capped at MAX_RETRY_DELAY_MS.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay_ms: u64,
    backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(base_delay_ms: u64, backoff_factor: f64) -> Self {
        Self {
            base_delay_ms,
            backoff_factor,
        }
    }

    /// Decide what follows attempt number `attempt` (1-based) out of `max_attempts`
    pub fn should_retry(&self, job_name: &str, attempt: u32, max_attempts: u32) -> RetryDecision {
        if attempt >= max_attempts {
            warn!(
                job = job_name,
                attempt,
                max_attempts,
                "Max attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let delay = self.delay_for(job_name, attempt);
        debug!(
            job = job_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );
        RetryDecision::Retry(delay)
    }

    /// Backoff delay after attempt `attempt` (1-based)
    pub fn delay_for(&self, job_name: &str, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);

        // Same job name, same jitter: no thundering herd, reproducible in tests
        let jitter_seed = job_name.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0);

        let delay_ms = (raw_ms * jitter_factor).min(MAX_RETRY_DELAY_MS as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_BACKOFF_FACTOR)
    }
}
