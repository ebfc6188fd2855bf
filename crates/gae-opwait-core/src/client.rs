//! App Engine Admin API client for operation lookups
//!
//! Only the one call the waiter needs is implemented: `apps.operations.get`.
//! The [`OperationsApi`] trait is the seam the poller depends on, so tests and
//! callers with their own transport can supply a different implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

use crate::operation::{Operation, operation_id};

/// Default App Engine Admin API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://appengine.googleapis.com/";

/// Errors returned by the API client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid operation name: '{0}'")]
    InvalidOperation(String),

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Map a non-success HTTP response to an error
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

        match status.as_u16() {
            400 => ApiError::BadRequest { message },
            401 => ApiError::AuthenticationFailed { message },
            403 => ApiError::PermissionDenied { message },
            404 => ApiError::NotFound { message },
            409 => ApiError::Conflict { message },
            429 => ApiError::RateLimited { message },
            code @ 500..=599 => ApiError::ServerError {
                status: code,
                message,
            },
            code => ApiError::Api {
                status: code,
                message,
            },
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::AuthenticationFailed { .. } | ApiError::PermissionDenied { .. }
        )
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::ServerError { .. })
    }

    /// Returns true if the request timed out at the transport level
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Request(e) if e.is_timeout())
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request(e) => e.is_timeout() || e.is_connect(),
            ApiError::RateLimited { .. } | ApiError::ServerError { .. } => true,
            _ => false,
        }
    }
}

/// Google error envelope: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn extract_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    (!envelope.error.message.is_empty()).then_some(envelope.error.message)
}

/// Operation lookups against a remote service
#[async_trait]
pub trait OperationsApi: Send + Sync {
    /// Fetch the current state of an operation owned by `app_id`
    async fn get_operation(&self, app_id: &str, operation: &str) -> Result<Operation, ApiError>;
}

/// HTTP client for the App Engine Admin API
#[derive(Debug, Clone)]
pub struct AppEngineClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl AppEngineClient {
    /// Start building a client
    pub fn builder() -> AppEngineClientBuilder {
        AppEngineClientBuilder::default()
    }

    /// The endpoint requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn operation_url(&self, app_id: &str, operation: &str) -> Result<Url, ApiError> {
        // An empty id would address the list endpoint instead
        let id = operation_id(operation);
        if id.is_empty() || app_id.is_empty() {
            return Err(ApiError::InvalidOperation(operation.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "apps", app_id, "operations", id]);
        Ok(url)
    }
}

#[async_trait]
impl OperationsApi for AppEngineClient {
    async fn get_operation(&self, app_id: &str, operation: &str) -> Result<Operation, ApiError> {
        let url = self.operation_url(app_id, operation)?;
        trace!("GET {}", url);

        let mut request = self.http.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(%status, operation, "Operation lookup failed");
            return Err(ApiError::from_response(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Builder for [`AppEngineClient`]
#[derive(Debug, Clone)]
pub struct AppEngineClientBuilder {
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl Default for AppEngineClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
            user_agent: concat!("gae-opwait/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AppEngineClientBuilder {
    /// Override the API endpoint
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// OAuth2 access token sent as a bearer token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<AppEngineClient, ApiError> {
        let base_url =
            Url::parse(&self.base_url).map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(self.base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(AppEngineClient {
            http,
            base_url,
            access_token: self.access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_url_from_bare_id() {
        let client = AppEngineClient::builder().build().unwrap();
        let url = client.operation_url("my-app", "1234-abcd").unwrap();
        assert_eq!(
            url.as_str(),
            "https://appengine.googleapis.com/v1/apps/my-app/operations/1234-abcd"
        );
    }

    #[test]
    fn test_operation_url_from_resource_name() {
        let client = AppEngineClient::builder()
            .base_url("http://localhost:8080/proxy/")
            .build()
            .unwrap();
        let url = client
            .operation_url("my-app", "apps/my-app/operations/1234-abcd")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/proxy/v1/apps/my-app/operations/1234-abcd"
        );
    }

    #[test]
    fn test_operation_url_rejects_empty_id() {
        let client = AppEngineClient::builder().build().unwrap();
        for operation in ["", "apps/my-app/operations/", "apps/my-app/operations//"] {
            let err = client.operation_url("my-app", operation).unwrap_err();
            assert!(
                matches!(err, ApiError::InvalidOperation(ref name) if name == operation),
                "{operation:?} gave {err:?}"
            );
        }
        assert!(matches!(
            client.operation_url("", "1234-abcd"),
            Err(ApiError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = AppEngineClient::builder()
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"code":404,"message":"Operation not found","status":"NOT_FOUND"}}"#;
        let err = ApiError::from_response(StatusCode::NOT_FOUND, body);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: Operation not found");

        let err = ApiError::from_response(StatusCode::FORBIDDEN, "");
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Permission denied: Forbidden");

        let err = ApiError::from_response(StatusCode::SERVICE_UNAVAILABLE, "oops");
        assert!(err.is_server_error());
        assert!(err.is_retryable());

        let err = ApiError::from_response(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(err.is_retryable());

        let err = ApiError::from_response(StatusCode::IM_A_TEAPOT, "");
        assert!(matches!(err, ApiError::Api { status: 418, .. }));
        assert!(!err.is_retryable());
    }
}
