use super::WebError;
use crate::service::{ApiVersion, UnsupportedApiVersion};
use crate::state::AppState;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

/// Request header selecting the listing contract.
pub const API_VERSION_HEADER: &str = "api-version";

#[derive(Debug, Deserialize)]
struct VersionQuery {
    version: Option<String>,
}

/// The API version a request asked for, from the `API-Version` header or the
/// `version` query parameter, falling back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedVersion(pub ApiVersion);

#[async_trait]
impl FromRequestParts<AppState> for RequestedVersion {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(API_VERSION_HEADER) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| UnsupportedApiVersion("<non-ascii>".to_string()))?
                    .to_string(),
            ),
            None => None,
        };
        let query = Query::<VersionQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.version);

        match header.or(query) {
            Some(raw) => Ok(Self(raw.parse()?)),
            None => Ok(Self(state.default_version)),
        }
    }
}
