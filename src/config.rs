use crate::error::{BillingError, Result};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;
pub const DEFAULT_CHARGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded retry policy for transient provider failures.
///
/// `max_attempts` counts every attempt in a failure chain, including the
/// first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// The attempt to schedule after `attempt` failed transiently, if any
    /// budget is left.
    pub fn next_attempt(&self, attempt: u32) -> Option<u32> {
        (attempt < self.max_attempts).then_some(attempt + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    pub retry: RetryPolicy,
    /// Maximum number of invoices charged at the same time during a batch.
    pub batch_concurrency: usize,
    /// Upper bound for a single provider call; expiry counts as a network error.
    pub charge_timeout: Duration,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            charge_timeout: DEFAULT_CHARGE_TIMEOUT,
        }
    }
}

impl BillingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(BillingError::ValidationError(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(BillingError::ValidationError(
                "batch concurrency must be at least 1".to_string(),
            ));
        }
        if self.charge_timeout.is_zero() {
            return Err(BillingError::ValidationError(
                "charge timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
