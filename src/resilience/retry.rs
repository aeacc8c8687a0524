use super::policy::RetryPolicy;
use std::fmt;
use std::future::Future;
use std::time::Instant;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// One invocation of a retried operation.
#[derive(Debug, Clone, Copy)]
pub struct CallAttempt {
    /// 1-based attempt index.
    pub number: u32,
    pub max_attempts: u32,
    pub started_at: Instant,
}

impl CallAttempt {
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    pub fn is_last(&self) -> bool {
        self.number >= self.max_attempts
    }
}

/// Terminal failure of a retried operation, tagged with the attempts it consumed.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("Gave up after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: E },

    #[error("Non-retryable failure on attempt {attempts}: {source}")]
    Fatal { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Fatal { attempts, .. } => *attempts,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn inner(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } | Self::Fatal { source, .. } => source,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::Fatal { source, .. } => source,
        }
    }
}

/// Decides whether a failure is worth another attempt.
pub trait RetryClassifier<E>: Send + Sync {
    fn is_retryable(&self, error: &E) -> bool;
}

impl<E, F> RetryClassifier<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn is_retryable(&self, error: &E) -> bool {
        self(error)
    }
}

/// Re-invokes an operation while it fails with a retryable error, up to the policy's budget.
#[derive(Debug, Clone)]
pub struct RetryExecutor<C> {
    policy: RetryPolicy,
    classifier: C,
}

impl<C> RetryExecutor<C> {
    pub fn new(policy: RetryPolicy, classifier: C) -> Self {
        Self { policy, classifier }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Runs `operation` until it succeeds, fails fatally, or the attempt budget is spent.
    ///
    /// Attempts run strictly one after another. Dropping the returned future
    /// abandons the loop, so no attempt starts after cancellation.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        C: RetryClassifier<E>,
        E: fmt::Display,
        F: FnMut(CallAttempt) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.policy.attempt_budget();
        let mut number = 1;

        loop {
            let attempt = CallAttempt {
                number,
                max_attempts,
                started_at: Instant::now(),
            };

            match operation(attempt).await {
                Ok(value) => {
                    debug!(
                        attempt = number,
                        elapsed_ms = attempt.started_at.elapsed().as_millis() as u64,
                        outcome = "success",
                        "attempt finished"
                    );
                    return Ok(value);
                }
                Err(err) if !self.classifier.is_retryable(&err) => {
                    debug!(attempt = number, outcome = "fatal", error = %err, "attempt finished");
                    return Err(RetryError::Fatal {
                        attempts: number,
                        source: err,
                    });
                }
                Err(err) if attempt.is_last() => {
                    warn!(attempts = number, error = %err, "retry budget exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: number,
                        source: err,
                    });
                }
                Err(err) => {
                    let delay = self.policy.backoff_after(number);
                    warn!(
                        attempt = number,
                        max_attempts,
                        outcome = "retryable",
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    number += 1;
                }
            }
        }
    }
}
