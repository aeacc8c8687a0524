use crate::core::{Dog, DogId, StorageResult};
use crate::storage::DogRepository;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Versions of the dog listing contract served side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Abbreviated `{ id, dogName }` records.
    V1_0,
    /// Full records.
    V1_1,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1_0, ApiVersion::V1_1];

    pub fn token(self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported API version '{0}', expected one of: 1.0, 1.1")]
pub struct UnsupportedApiVersion(pub String);

impl FromStr for ApiVersion {
    type Err = UnsupportedApiVersion;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        Self::ALL
            .into_iter()
            .find(|version| version.token() == token)
            .ok_or_else(|| UnsupportedApiVersion(token.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DogSummary {
    pub id: DogId,
    #[serde(rename = "dogName")]
    pub dog_name: String,
}

/// A dog rendered for one API version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DogView {
    Full(Dog),
    Summary(DogSummary),
}

pub fn project(dog: Dog, version: ApiVersion) -> DogView {
    match version {
        ApiVersion::V1_1 => DogView::Full(dog),
        ApiVersion::V1_0 => DogView::Summary(DogSummary {
            id: dog.id,
            dog_name: dog.name,
        }),
    }
}

pub struct DogListingService {
    repo: Arc<dyn DogRepository>,
}

impl DogListingService {
    pub fn new(repo: Arc<dyn DogRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, version: ApiVersion) -> StorageResult<Vec<DogView>> {
        let dogs = self.repo.find_all().await?;
        Ok(dogs.into_iter().map(|dog| project(dog, version)).collect())
    }
}
