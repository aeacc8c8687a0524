use super::policy::AdmissionPolicy;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore, TryAcquireError};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Operation '{key}' is at its concurrency limit of {limit}")]
    Rejected { key: String, limit: usize },

    #[error("Operation '{key}' could not acquire a slot within {waited_ms}ms")]
    Overloaded { key: String, waited_ms: u64 },

    #[error("Admission for operation '{key}' is closed")]
    Closed { key: String },
}

impl AdmissionError {
    pub fn key(&self) -> &str {
        match self {
            Self::Rejected { key, .. } | Self::Overloaded { key, .. } | Self::Closed { key } => key,
        }
    }
}

/// A granted execution slot.
///
/// The slot returns to its limiter when the token is dropped, on every exit path.
#[derive(Debug)]
pub struct AdmissionToken {
    key: Arc<str>,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionToken {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        trace!(key = %self.key, "admission slot released");
    }
}

/// Point-in-time view of one limiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionStats {
    pub key: String,
    pub limit: usize,
    pub in_flight: usize,
    pub available: usize,
}

/// Bounds how many callers may run one logical operation at the same time.
///
/// Cloning yields a handle to the same slots. Waiters are admitted in FIFO order.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    key: Arc<str>,
    limit: usize,
    acquire_timeout: Option<Duration>,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyLimit {
    pub fn new(key: impl Into<Arc<str>>, policy: AdmissionPolicy) -> Self {
        let limit = policy.max_concurrency.max(1);
        Self {
            key: key.into(),
            limit,
            acquire_timeout: policy.acquire_timeout_ms.map(Duration::from_millis),
            semaphore: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Acquires a slot according to the configured wait policy.
    pub async fn acquire(&self) -> Result<AdmissionToken, AdmissionError> {
        let permit = match self.acquire_timeout {
            None => self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| self.closed())?,
            Some(wait) if wait.is_zero() => {
                self.semaphore
                    .clone()
                    .try_acquire_owned()
                    .map_err(|err| match err {
                        TryAcquireError::NoPermits => {
                            warn!(key = %self.key, limit = self.limit, "admission rejected");
                            AdmissionError::Rejected {
                                key: self.key.to_string(),
                                limit: self.limit,
                            }
                        }
                        TryAcquireError::Closed => self.closed(),
                    })?
            }
            Some(wait) => {
                let waited_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
                timeout(wait, self.semaphore.clone().acquire_owned())
                    .await
                    .map_err(|_| {
                        warn!(key = %self.key, waited_ms, "admission timed out");
                        AdmissionError::Overloaded {
                            key: self.key.to_string(),
                            waited_ms,
                        }
                    })?
                    .map_err(|_| self.closed())?
            }
        };

        debug!(
            key = %self.key,
            in_flight = self.in_flight(),
            limit = self.limit,
            "admission slot granted"
        );

        Ok(AdmissionToken {
            key: Arc::clone(&self.key),
            _permit: permit,
        })
    }

    /// Runs `operation` while holding a single slot for its whole duration.
    ///
    /// Futures are lazy, so nothing in `operation` executes before admission.
    pub async fn guard<F, T>(&self, operation: F) -> Result<T, AdmissionError>
    where
        F: Future<Output = T>,
    {
        let _token = self.acquire().await?;
        Ok(operation.await)
    }

    pub fn in_flight(&self) -> usize {
        self.limit - self.semaphore.available_permits()
    }

    pub fn stats(&self) -> AdmissionStats {
        let available = self.semaphore.available_permits();
        AdmissionStats {
            key: self.key.to_string(),
            limit: self.limit,
            in_flight: self.limit - available,
            available,
        }
    }

    fn closed(&self) -> AdmissionError {
        AdmissionError::Closed {
            key: self.key.to_string(),
        }
    }
}

/// Registry of per-operation limiters. Distinct keys never share slots.
#[derive(Debug, Default)]
pub struct AdmissionController {
    default_policy: AdmissionPolicy,
    overrides: HashMap<String, AdmissionPolicy>,
    limits: RwLock<HashMap<String, ConcurrencyLimit>>,
}

impl AdmissionController {
    pub fn new(default_policy: AdmissionPolicy) -> Self {
        Self {
            default_policy,
            overrides: HashMap::new(),
            limits: RwLock::new(HashMap::new()),
        }
    }

    /// Uses `policy` instead of the default for operation `key`.
    pub fn with_policy(mut self, key: impl Into<String>, policy: AdmissionPolicy) -> Self {
        self.overrides.insert(key.into(), policy);
        self
    }

    /// Returns the limiter guarding `key`, creating it on first use.
    pub async fn limit_for(&self, key: &str) -> ConcurrencyLimit {
        if let Some(limit) = self.limits.read().await.get(key) {
            return limit.clone();
        }

        let mut limits = self.limits.write().await;
        limits
            .entry(key.to_string())
            .or_insert_with(|| {
                let policy = self
                    .overrides
                    .get(key)
                    .copied()
                    .unwrap_or(self.default_policy);
                ConcurrencyLimit::new(key, policy)
            })
            .clone()
    }

    pub async fn acquire(&self, key: &str) -> Result<AdmissionToken, AdmissionError> {
        self.limit_for(key).await.acquire().await
    }

    pub async fn stats(&self) -> Vec<AdmissionStats> {
        let mut stats: Vec<AdmissionStats> = self
            .limits
            .read()
            .await
            .values()
            .map(ConcurrencyLimit::stats)
            .collect();
        stats.sort_by(|a, b| a.key.cmp(&b.key));
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn first_k_acquisitions_are_immediate_and_the_next_one_waits() {
        let limit = ConcurrencyLimit::new("facts", AdmissionPolicy::new(3));

        let mut held = Vec::new();
        for _ in 0..3 {
            let mut acquire = task::spawn(limit.acquire());
            held.push(assert_ready!(acquire.poll()).unwrap());
        }
        assert_eq!(limit.in_flight(), 3);

        let mut waiting = task::spawn(limit.acquire());
        assert_pending!(waiting.poll());

        held.pop().unwrap().release();
        assert!(waiting.is_woken());
        let token = assert_ready!(waiting.poll()).unwrap();
        assert_eq!(token.key(), "facts");
        assert_eq!(limit.in_flight(), 3);
    }

    #[tokio::test]
    async fn rejecting_policy_fails_fast_when_full() {
        let limit = ConcurrencyLimit::new("facts", AdmissionPolicy::new(1).rejecting());
        let _held = limit.acquire().await.unwrap();

        let err = limit.acquire().await.unwrap_err();
        assert_eq!(
            err,
            AdmissionError::Rejected {
                key: "facts".to_string(),
                limit: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_reports_overload() {
        let limit = ConcurrencyLimit::new("facts", AdmissionPolicy::new(1).with_acquire_timeout(20));
        let _held = limit.acquire().await.unwrap();

        let err = limit.acquire().await.unwrap_err();
        assert!(matches!(err, AdmissionError::Overloaded { waited_ms: 20, .. }));
        assert_eq!(err.key(), "facts");
    }

    #[tokio::test]
    async fn guard_releases_the_slot_when_the_operation_fails() {
        let limit = ConcurrencyLimit::new("facts", AdmissionPolicy::new(2));

        let outcome = limit
            .guard(async { Err::<(), &str>("boom") })
            .await
            .unwrap();
        assert_eq!(outcome, Err("boom"));
        assert_eq!(limit.stats().available, 2);
    }

    #[tokio::test]
    async fn cancelled_waiter_leaves_no_slot_behind() {
        let limit = ConcurrencyLimit::new("facts", AdmissionPolicy::new(1));
        let held = limit.acquire().await.unwrap();

        let mut waiting = task::spawn(limit.acquire());
        assert_pending!(waiting.poll());
        drop(waiting);

        held.release();
        assert_eq!(limit.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_limits() {
        let controller = AdmissionController::new(AdmissionPolicy::new(1).rejecting())
            .with_policy("dogs", AdmissionPolicy::new(2).rejecting());

        let _facts = controller.acquire("facts").await.unwrap();
        assert!(controller.acquire("facts").await.is_err());

        let _dogs_a = controller.acquire("dogs").await.unwrap();
        let _dogs_b = controller.acquire("dogs").await.unwrap();

        let stats = controller.stats().await;
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].key, "dogs");
        assert_eq!(stats[0].in_flight, 2);
        assert_eq!(stats[1].key, "facts");
        assert_eq!(stats[1].limit, 1);
    }

    #[tokio::test]
    async fn limit_for_returns_handles_to_the_same_slots() {
        let controller = AdmissionController::new(AdmissionPolicy::new(4));
        let a = controller.limit_for("facts").await;
        let b = controller.limit_for("facts").await;

        let _token = a.acquire().await.unwrap();
        assert_eq!(b.in_flight(), 1);
    }
}
