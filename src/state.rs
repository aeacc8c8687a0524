use std::sync::Arc;

use crate::config::{AppConfig, FactsConfig};
use crate::resilience::{AdmissionController, RetryExecutor};
use crate::service::{
    AdoptionService, ApiVersion, CAT_FACTS_OPERATION, CatFactsService, DogListingService,
};
use crate::storage::DogRepository;
use crate::upstream::{CatFactsClient, FlakyCatFactsClient};

#[derive(Clone)]
pub struct AppState {
    pub listing: Arc<DogListingService>,
    pub adoption: Arc<AdoptionService>,
    pub facts: Arc<CatFactsService>,
    pub admission: Arc<AdmissionController>,
    pub default_version: ApiVersion,
}

impl AppState {
    /// Wires the services from configuration and the two external collaborators.
    pub async fn from_config(
        config: &AppConfig,
        repo: Arc<dyn DogRepository>,
        client: Arc<dyn CatFactsClient>,
    ) -> Self {
        let admission = Arc::new(AdmissionController::new(config.facts.admission));
        let facts = facts_service(&config.facts, &admission, client).await;

        Self {
            listing: Arc::new(DogListingService::new(Arc::clone(&repo))),
            adoption: Arc::new(AdoptionService::new(repo)),
            facts: Arc::new(facts),
            admission,
            default_version: config.dogs.default_version,
        }
    }
}

async fn facts_service(
    config: &FactsConfig,
    admission: &AdmissionController,
    client: Arc<dyn CatFactsClient>,
) -> CatFactsService {
    let client: Arc<dyn CatFactsClient> = if config.simulated_failures > 0 {
        Arc::new(FlakyCatFactsClient::new(client, config.simulated_failures))
    } else {
        client
    };

    CatFactsService::new(
        client,
        admission.limit_for(CAT_FACTS_OPERATION).await,
        RetryExecutor::new(config.retry, config.retry_on.clone()),
    )
}
