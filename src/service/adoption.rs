use crate::core::{Dog, DogId, StorageResult};
use crate::storage::DogRepository;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdoptionOutcome {
    Adopted(Dog),
    /// No dog has this id; nothing was written.
    UnknownDog(DogId),
}

/// Reassigns a dog to a new owner.
///
/// This is a plain read-then-write with no version check, so two concurrent
/// adoptions of the same dog both succeed and the last write wins.
pub struct AdoptionService {
    repo: Arc<dyn DogRepository>,
}

impl AdoptionService {
    pub fn new(repo: Arc<dyn DogRepository>) -> Self {
        Self { repo }
    }

    pub async fn adopt(&self, dog_id: DogId, new_owner: &str) -> StorageResult<AdoptionOutcome> {
        let Some(dog) = self.repo.find_by_id(dog_id).await? else {
            warn!(dog_id, "adoption requested for unknown dog, ignoring");
            return Ok(AdoptionOutcome::UnknownDog(dog_id));
        };

        let updated = self.repo.save(dog.adopted_by(new_owner)).await?;
        info!(dog_id, owner = new_owner, name = %updated.name, "adopted");
        Ok(AdoptionOutcome::Adopted(updated))
    }
}
