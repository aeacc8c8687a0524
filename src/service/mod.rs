//! Request-level operations behind the HTTP handlers.

pub mod adoption;
pub mod facts;
pub mod listing;

pub use adoption::{AdoptionOutcome, AdoptionService};
pub use facts::{CAT_FACTS_OPERATION, CatFactsService, FactsError};
pub use listing::{ApiVersion, DogListingService, DogSummary, DogView, UnsupportedApiVersion, project};
