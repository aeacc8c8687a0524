// ============================================================================
// Adoptions Service Library
// ============================================================================

pub mod app;
pub mod config;
pub mod core;
pub mod resilience;
pub mod service;
pub mod state;
pub mod storage;
pub mod upstream;
pub mod web;

pub use app::build_router;
pub use config::AppConfig;
pub use crate::core::{CatFact, CatFacts, Dog, DogId, StorageError};
pub use resilience::{
    AdmissionController, AdmissionError, AdmissionPolicy, AdmissionToken, ConcurrencyLimit,
    ResilienceError, ResilientCall, RetryError, RetryExecutor, RetryPolicy,
};
pub use state::AppState;
