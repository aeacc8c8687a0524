use crate::core::CatFacts;
use crate::resilience::{
    AdmissionStats, ConcurrencyLimit, ResilienceError, ResilientCall, RetryExecutor,
};
use crate::upstream::{CatFactsClient, RetryOn, UpstreamError};
use std::sync::Arc;
use tracing::debug;

/// Admission key guarding calls to the cat facts provider.
pub const CAT_FACTS_OPERATION: &str = "cat-facts";

pub type FactsError = ResilienceError<UpstreamError>;

/// Fetches cat facts through the concurrency limit and retry loop.
pub struct CatFactsService {
    client: Arc<dyn CatFactsClient>,
    resilient: ResilientCall<RetryOn>,
}

impl CatFactsService {
    pub fn new(
        client: Arc<dyn CatFactsClient>,
        limit: ConcurrencyLimit,
        retry: RetryExecutor<RetryOn>,
    ) -> Self {
        Self {
            client,
            resilient: ResilientCall::new(limit, retry),
        }
    }

    pub async fn facts(&self) -> Result<CatFacts, FactsError> {
        let client = self.client.as_ref();
        self.resilient
            .call(move |attempt| {
                debug!(
                    attempt = attempt.number,
                    max_attempts = attempt.max_attempts,
                    "calling cat facts provider"
                );
                client.fetch_facts()
            })
            .await
    }

    pub fn admission(&self) -> AdmissionStats {
        self.resilient.limit().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CatFact;
    use crate::resilience::{AdmissionPolicy, RetryError, RetryPolicy};
    use crate::upstream::{FlakyCatFactsClient, UpstreamErrorKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingClient {
        calls: AtomicU32,
        outcome: Result<(), UpstreamError>,
    }

    impl CountingClient {
        fn new(outcome: Result<(), UpstreamError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                outcome,
            })
        }
    }

    #[async_trait]
    impl CatFactsClient for CountingClient {
        async fn fetch_facts(&self) -> Result<CatFacts, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(|()| {
                CatFacts::from_iter([CatFact {
                    fact: "A group of cats is called a clowder.".to_string(),
                }])
            })
        }
    }

    fn service(client: Arc<dyn CatFactsClient>, max_attempts: u32) -> CatFactsService {
        CatFactsService::new(
            client,
            ConcurrencyLimit::new(CAT_FACTS_OPERATION, AdmissionPolicy::new(10)),
            RetryExecutor::new(RetryPolicy::immediate(max_attempts), RetryOn::default()),
        )
    }

    #[tokio::test]
    async fn fourth_attempt_is_the_first_to_succeed() {
        let upstream = CountingClient::new(Ok(()));
        let flaky = Arc::new(FlakyCatFactsClient::new(upstream.clone(), 3));
        let service = service(flaky.clone(), 4);

        let facts = service.facts().await.unwrap();

        assert_eq!(facts.len(), 1);
        assert_eq!(flaky.calls(), 4);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.admission().in_flight, 0);
    }

    #[tokio::test]
    async fn one_failure_too_many_exhausts_the_budget() {
        let upstream = CountingClient::new(Ok(()));
        let flaky = Arc::new(FlakyCatFactsClient::new(upstream.clone(), 4));
        let service = service(flaky.clone(), 4);

        let err = service.facts().await.unwrap_err();

        assert!(matches!(
            err,
            ResilienceError::Retry(RetryError::Exhausted { attempts: 4, .. })
        ));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_requests_are_not_retried() {
        let upstream = CountingClient::new(Err(UpstreamError::rejected("404 Not Found")));
        let service = service(upstream.clone(), 4);

        let err = service.facts().await.unwrap_err();

        assert!(matches!(
            err,
            ResilienceError::Retry(RetryError::Fatal { attempts: 1, .. })
        ));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn configured_kinds_widen_what_is_retried() {
        let upstream = CountingClient::new(Err(UpstreamError::decode("unexpected end of input")));
        let service = CatFactsService::new(
            upstream.clone(),
            ConcurrencyLimit::new(CAT_FACTS_OPERATION, AdmissionPolicy::new(10)),
            RetryExecutor::new(
                RetryPolicy::immediate(3),
                RetryOn::kinds([UpstreamErrorKind::Unavailable, UpstreamErrorKind::Decode]),
            ),
        );

        let err = service.facts().await.unwrap_err();

        assert!(matches!(
            err,
            ResilienceError::Retry(RetryError::Exhausted { attempts: 3, .. })
        ));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);
    }
}
