pub mod error;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use types::{CatFact, CatFacts, Dog, DogId};
