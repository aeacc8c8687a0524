use super::{CatFactsClient, UpstreamError};
use crate::core::CatFacts;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CAT_FACTS_URL: &str = "https://www.catfacts.net/api";

/// Cat facts client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpCatFactsClient {
    http: reqwest::Client,
    url: String,
}

impl HttpCatFactsClient {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(http, url))
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatFactsClient for HttpCatFactsClient {
    async fn fetch_facts(&self) -> Result<CatFacts, UpstreamError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
        {
            return Err(UpstreamError::unavailable(format!(
                "provider answered {status}"
            )));
        }
        if !status.is_success() {
            return Err(UpstreamError::rejected(format!(
                "provider answered {status}"
            )));
        }

        // Reading the body can still time out or lose the connection.
        let body = response.bytes().await.map_err(classify_transport_error)?;
        let facts = serde_json::from_slice::<CatFacts>(&body)
            .map_err(|err| UpstreamError::decode(err.to_string()))?;
        debug!(url = %self.url, count = facts.len(), "fetched cat facts");
        Ok(facts)
    }
}

fn classify_transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        UpstreamError::unavailable(err.to_string())
    } else if err.is_decode() {
        UpstreamError::decode(err.to_string())
    } else {
        UpstreamError::rejected(err.to_string())
    }
}
