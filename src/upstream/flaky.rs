use super::{CatFactsClient, UpstreamError};
use crate::core::CatFacts;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Decorator that fails the first `failures` calls with a transient error.
///
/// The counter belongs to this instance, so retry behavior only ever sees the
/// outcome each call reports.
pub struct FlakyCatFactsClient {
    inner: Arc<dyn CatFactsClient>,
    failures: u64,
    calls: AtomicU64,
}

impl FlakyCatFactsClient {
    pub fn new(inner: Arc<dyn CatFactsClient>, failures: u64) -> Self {
        Self {
            inner,
            failures,
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatFactsClient for FlakyCatFactsClient {
    async fn fetch_facts(&self) -> Result<CatFacts, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            warn!(call, failures = self.failures, "simulated outage");
            return Err(UpstreamError::unavailable("No more facts"));
        }
        info!(call, "all good!");
        self.inner.fetch_facts().await
    }
}
