pub mod memory;

pub use memory::InMemoryDogRepository;

use crate::core::{Dog, DogId, StorageResult};
use async_trait::async_trait;

/// Persistence contract for dog records.
///
/// Implementations are expected to be strongly consistent: a `save` is visible
/// to every subsequent `find_by_id` and `find_all`.
#[async_trait]
pub trait DogRepository: Send + Sync {
    async fn find_by_id(&self, id: DogId) -> StorageResult<Option<Dog>>;
    async fn save(&self, dog: Dog) -> StorageResult<Dog>;
    async fn find_all(&self) -> StorageResult<Vec<Dog>>;
}

/// Records loaded at startup when seeding is enabled.
pub fn sample_dogs() -> Vec<Dog> {
    vec![
        Dog::new(1, "Jasper", "A grey Shih Tzu who loves the couch"),
        Dog::new(2, "Prancer", "A demonic, neurotic, man hating, animal hating, children hating dog"),
        Dog::new(3, "Bailey", "A golden retriever with endless energy"),
        Dog::new(4, "Rocky", "A stubborn bulldog with a big heart"),
        Dog::new(5, "Lola", "A shy beagle that warms up with treats"),
        Dog::new(6, "Duke", "A senior labrador looking for a quiet home"),
        Dog::new(7, "Toby", "A playful terrier mix").with_owner("nobody"),
    ]
}
