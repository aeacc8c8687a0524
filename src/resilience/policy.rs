use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior on transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, counting the first one.
    pub max_attempts: u32,
    /// Initial backoff duration in milliseconds. Zero retries immediately.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 0,
            max_backoff_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately, up to `max_attempts` total attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    pub fn with_backoff(mut self, initial_ms: u64, max_ms: u64) -> Self {
        self.initial_backoff_ms = initial_ms;
        self.max_backoff_ms = max_ms;
        self
    }

    /// Attempt budget with the zero case normalized to a single attempt.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Exponential backoff before the attempt following failed attempt `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        if self.initial_backoff_ms == 0 {
            return Duration::ZERO;
        }
        let base = self.initial_backoff_ms;
        let max = self.max_backoff_ms.max(base);
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(base.saturating_mul(factor).min(max))
    }
}

/// Configuration for bounding concurrent executions of a guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    /// Maximum number of concurrent in-flight executions.
    pub max_concurrency: usize,
    /// How long to wait for a slot.
    ///
    /// `None` waits until a slot frees, `Some(0)` rejects immediately when full.
    pub acquire_timeout_ms: Option<u64>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            acquire_timeout_ms: None,
        }
    }
}

impl AdmissionPolicy {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            acquire_timeout_ms: None,
        }
    }

    pub fn with_acquire_timeout(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = Some(timeout_ms);
        self
    }

    /// Rejects callers outright instead of queueing them.
    pub fn rejecting(mut self) -> Self {
        self.acquire_timeout_ms = Some(0);
        self
    }
}
