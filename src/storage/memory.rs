use super::DogRepository;
use crate::core::{Dog, DogId, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Dog records kept in process memory, ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryDogRepository {
    dogs: RwLock<BTreeMap<DogId, Dog>>,
}

impl InMemoryDogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dogs(dogs: impl IntoIterator<Item = Dog>) -> Self {
        Self {
            dogs: RwLock::new(dogs.into_iter().map(|dog| (dog.id, dog)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.dogs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.dogs.read().await.is_empty()
    }
}

#[async_trait]
impl DogRepository for InMemoryDogRepository {
    async fn find_by_id(&self, id: DogId) -> StorageResult<Option<Dog>> {
        Ok(self.dogs.read().await.get(&id).cloned())
    }

    async fn save(&self, dog: Dog) -> StorageResult<Dog> {
        if dog.name.trim().is_empty() {
            return Err(StorageError::InvalidRecord(format!(
                "dog {} must have a name",
                dog.id
            )));
        }
        self.dogs.write().await.insert(dog.id, dog.clone());
        Ok(dog)
    }

    async fn find_all(&self) -> StorageResult<Vec<Dog>> {
        Ok(self.dogs.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sample_dogs;

    #[tokio::test]
    async fn save_then_find_round_trip() {
        let repo = InMemoryDogRepository::new();
        assert!(repo.is_empty().await);

        let saved = repo
            .save(Dog::new(1, "Jasper", "A grey Shih Tzu"))
            .await
            .expect("save should succeed");

        let fetched = repo
            .find_by_id(saved.id)
            .await
            .expect("find should succeed")
            .expect("dog should exist");
        assert_eq!(fetched, saved);
        assert!(repo.find_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_is_ordered_by_id() {
        let mut dogs = sample_dogs();
        dogs.reverse();
        let repo = InMemoryDogRepository::with_dogs(dogs);

        let ids: Vec<DogId> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|dog| dog.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn save_rejects_nameless_dogs() {
        let repo = InMemoryDogRepository::new();
        let err = repo.save(Dog::new(1, "  ", "ghost")).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
        assert_eq!(repo.len().await, 0);
    }
}
