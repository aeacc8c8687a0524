use std::sync::Arc;

use adoptions::{
    AdmissionController, AppState, build_router,
    config::{AppConfig, Cli},
    storage::{DogRepository, InMemoryDogRepository, sample_dogs},
    upstream::{CatFactsClient, HttpCatFactsClient},
};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.apply(AppConfig::from_env().context("failed to load application configuration")?);

    let repository: Arc<dyn DogRepository> = if config.dogs.seed_sample {
        let dogs = sample_dogs();
        info!(count = dogs.len(), "seeding sample dogs");
        Arc::new(InMemoryDogRepository::with_dogs(dogs))
    } else {
        Arc::new(InMemoryDogRepository::new())
    };

    let client: Arc<dyn CatFactsClient> = Arc::new(
        HttpCatFactsClient::new(config.facts.url.clone(), config.facts.request_timeout)
            .context("failed to build cat facts HTTP client")?,
    );

    info!(
        url = %config.facts.url,
        max_concurrency = config.facts.admission.max_concurrency,
        max_attempts = config.facts.retry.max_attempts,
        retry_on = ?config.facts.retry_on.as_slice(),
        simulated_failures = config.facts.simulated_failures,
        "cat facts resilience configured"
    );

    let state = AppState::from_config(&config, repository, client).await;
    let admission = Arc::clone(&state.admission);
    let app = build_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, default_api_version = %config.dogs.default_version, "adoptions service started");

    axum::serve(listener, app)
        .with_graceful_shutdown(drain_on_shutdown(admission))
        .await
        .context("server error")?;

    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "adoptions=debug,tower_http=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM, then reports cat facts calls still holding a slot.
///
/// Those calls keep running until they finish; the server drains them before exiting.
async fn drain_on_shutdown(admission: Arc<AdmissionController>) {
    let signal = wait_for_signal().await;

    let busy: Vec<_> = admission
        .stats()
        .await
        .into_iter()
        .filter(|stats| stats.in_flight > 0)
        .collect();
    if busy.is_empty() {
        info!(signal, "shutting down");
    } else {
        for stats in busy {
            warn!(signal, key = %stats.key, in_flight = stats.in_flight, "shutting down, waiting for admitted calls");
        }
    }
}

async fn wait_for_signal() -> &'static str {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(err) => {
                error!(error = %err, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(err) => {
                error!(error = %err, "SIGTERM handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
