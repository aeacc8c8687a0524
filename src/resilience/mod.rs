//! Admission control and retry for outbound calls.
//!
//! A [`ResilientCall`] nests the two explicitly: the retry loop is built first and
//! the whole loop runs under one [`AdmissionToken`], so retries never bypass the
//! concurrency limit.

pub mod limiter;
pub mod policy;
pub mod retry;

pub use limiter::{AdmissionController, AdmissionError, AdmissionStats, AdmissionToken, ConcurrencyLimit};
pub use policy::{AdmissionPolicy, RetryPolicy};
pub use retry::{CallAttempt, RetryClassifier, RetryError, RetryExecutor};

use std::fmt;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResilienceError<E> {
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Retry(RetryError<E>),
}

impl<E> From<RetryError<E>> for ResilienceError<E> {
    fn from(err: RetryError<E>) -> Self {
        Self::Retry(err)
    }
}

/// Concurrency limit wrapped around a bounded retry loop.
#[derive(Debug, Clone)]
pub struct ResilientCall<C> {
    limit: ConcurrencyLimit,
    retry: RetryExecutor<C>,
}

impl<C> ResilientCall<C> {
    pub fn new(limit: ConcurrencyLimit, retry: RetryExecutor<C>) -> Self {
        Self { limit, retry }
    }

    pub fn limit(&self) -> &ConcurrencyLimit {
        &self.limit
    }

    pub fn retry(&self) -> &RetryExecutor<C> {
        &self.retry
    }

    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        C: RetryClassifier<E>,
        E: fmt::Display,
        F: FnMut(CallAttempt) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let retrying = self.retry.execute(operation);
        let outcome = self.limit.guard(retrying).await?;
        Ok(outcome?)
    }
}
