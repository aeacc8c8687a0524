//! HTTP surface: error mapping, version negotiation and handlers.

pub mod handlers;
pub mod version;

use crate::core::StorageError;
use crate::resilience::{ResilienceError, RetryError};
use crate::service::{FactsError, UnsupportedApiVersion};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Attempts made before giving up, reported only on retry exhaustion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Facts(FactsError),
    UnsupportedVersion(UnsupportedApiVersion),
}

impl From<StorageError> for WebError {
    fn from(err: StorageError) -> Self {
        WebError::Storage(err)
    }
}

impl From<FactsError> for WebError {
    fn from(err: FactsError) -> Self {
        WebError::Facts(err)
    }
}

impl From<UnsupportedApiVersion> for WebError {
    fn from(err: UnsupportedApiVersion) -> Self {
        WebError::UnsupportedVersion(err)
    }
}

impl WebError {
    fn parts(self) -> (StatusCode, ErrorResponse) {
        let (status, error, code, attempts) = match self {
            WebError::Storage(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                "storage_error",
                None,
            ),
            WebError::UnsupportedVersion(err) => (
                StatusCode::BAD_REQUEST,
                err.to_string(),
                "unsupported_api_version",
                None,
            ),
            WebError::Facts(ResilienceError::Admission(err)) => (
                StatusCode::TOO_MANY_REQUESTS,
                err.to_string(),
                "overloaded",
                None,
            ),
            WebError::Facts(ResilienceError::Retry(RetryError::Exhausted { attempts, source })) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("cat facts provider unavailable: {source}"),
                "retry_exhausted",
                Some(attempts),
            ),
            WebError::Facts(ResilienceError::Retry(RetryError::Fatal { source, .. })) => (
                StatusCode::BAD_GATEWAY,
                format!("cat facts provider failed: {source}"),
                "upstream_failure",
                None,
            ),
        };

        (
            status,
            ErrorResponse {
                error,
                code: code.to_string(),
                attempts,
            },
        )
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code = %body.code, error = %body.error, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::AdmissionError;
    use crate::upstream::UpstreamError;

    #[test]
    fn exhaustion_reports_attempts() {
        let err = WebError::from(FactsError::Retry(RetryError::Exhausted {
            attempts: 4,
            source: UpstreamError::unavailable("No more facts"),
        }));
        let (status, body) = err.parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "retry_exhausted");
        assert_eq!(body.attempts, Some(4));
    }

    #[test]
    fn fatal_failure_hides_the_attempt_count() {
        let err = WebError::from(FactsError::Retry(RetryError::Fatal {
            attempts: 1,
            source: UpstreamError::rejected("provider answered 404 Not Found"),
        }));
        let (status, body) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "upstream_failure");
        assert_eq!(body.attempts, None);
    }

    #[test]
    fn overload_is_distinct_from_upstream_failure() {
        let err = WebError::from(FactsError::Admission(AdmissionError::Overloaded {
            key: "cat-facts".to_string(),
            waited_ms: 100,
        }));
        let (status, body) = err.parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.code, "overloaded");
    }

    #[test]
    fn storage_failures_map_to_internal_errors() {
        let err = WebError::from(StorageError::Unavailable("disk on fire".to_string()));
        let (status, body) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "storage_error");
    }
}
