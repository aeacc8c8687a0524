//! Clients for the third-party cat facts provider.

pub mod flaky;
pub mod http;

pub use flaky::FlakyCatFactsClient;
pub use http::HttpCatFactsClient;

use crate::core::CatFacts;
use crate::resilience::RetryClassifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Broad classes of upstream failure used to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    /// Connection failures, timeouts, throttling and 5xx responses.
    Unavailable,
    /// The provider refused the request (non-429 4xx).
    Rejected,
    /// The response body could not be decoded.
    Decode,
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unavailable => "unavailable",
            Self::Rejected => "rejected",
            Self::Decode => "decode",
        };
        f.write_str(name)
    }
}

impl FromStr for UpstreamErrorKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unavailable" | "transient" => Ok(Self::Unavailable),
            "rejected" => Ok(Self::Rejected),
            "decode" => Ok(Self::Decode),
            other => Err(format!(
                "unknown upstream error kind '{other}', expected one of: unavailable, rejected, decode"
            )),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} upstream failure: {message}")]
pub struct UpstreamError {
    kind: UpstreamErrorKind,
    message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Unavailable, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Rejected, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Decode, message)
    }

    pub fn kind(&self) -> UpstreamErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Issues one logical call to the cat facts provider.
#[async_trait]
pub trait CatFactsClient: Send + Sync {
    async fn fetch_facts(&self) -> Result<CatFacts, UpstreamError>;
}

/// Retries only failures whose kind is in the configured set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOn {
    kinds: Vec<UpstreamErrorKind>,
}

impl RetryOn {
    pub fn kinds(kinds: impl IntoIterator<Item = UpstreamErrorKind>) -> Self {
        let mut kinds: Vec<_> = kinds.into_iter().collect();
        kinds.sort_by_key(|kind| *kind as u8);
        kinds.dedup();
        Self { kinds }
    }

    pub fn matches(&self, kind: UpstreamErrorKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn as_slice(&self) -> &[UpstreamErrorKind] {
        &self.kinds
    }
}

impl Default for RetryOn {
    fn default() -> Self {
        Self::kinds([UpstreamErrorKind::Unavailable])
    }
}

impl FromStr for RetryOn {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let kinds = raw
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(UpstreamErrorKind::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::kinds(kinds))
    }
}

impl RetryClassifier<UpstreamError> for RetryOn {
    fn is_retryable(&self, error: &UpstreamError) -> bool {
        self.matches(error.kind())
    }
}
