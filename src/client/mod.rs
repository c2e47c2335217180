//! JSON-over-HTTP client for the Banana Brain backend.
//!
//! Attaches the bearer token from the configured [`CredentialStore`] to every
//! request and normalizes the backend's success/error envelope into
//! [`ApiResult`].

mod credentials;

pub use credentials::{CredentialStore, FileCredentials, MemoryCredentials};

use reqwest::{Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Field-level validation error as reported by the backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldError {
    pub msg: String,
    #[serde(default)]
    pub param: String,
}

/// Errors that can occur while talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Response parsing failed: {0}")]
    Parse(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl ApiError {
    /// Text suitable for showing to the player
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected {
                message, details, ..
            } => {
                if !details.is_empty() && message == DEFAULT_ERROR_MESSAGE {
                    details
                        .iter()
                        .map(|d| d.msg.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                } else {
                    message.clone()
                }
            }
            ApiError::Network(msg) => msg.clone(),
            ApiError::Timeout(_) => "The server took too long to respond".to_string(),
            ApiError::Parse(_) | ApiError::InvalidPayload(_) => {
                "Unexpected response from server".to_string()
            }
        }
    }

    /// Like [`ApiError::user_message`], but field-level validation messages
    /// win over the top-level error whenever the backend sent any
    pub fn validation_message(&self) -> String {
        match self {
            ApiError::Rejected { details, .. } if !details.is_empty() => details
                .iter()
                .map(|d| d.msg.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => self.user_message(),
        }
    }

    /// HTTP status for rejected requests
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Error body shape; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// Thin wrapper around `reqwest::Client` bound to one backend base URL
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, endpoint, &[], &[], None)
            .await
    }

    /// GET with extra path segments and query pairs, both percent-encoded
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, endpoint, segments, query, None)
            .await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::POST, endpoint, &[], &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PUT, endpoint, &[], &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::DELETE, endpoint, &[], &[], None)
            .await
    }

    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<T> {
        let url = self.url(endpoint, segments, query)?;
        tracing::debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(token) = self.credentials.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        normalize_envelope(status, &bytes)
    }

    fn url(&self, endpoint: &str, segments: &[&str], query: &[(&str, String)]) -> ApiResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| ApiError::Network(format!("Invalid URL for {}: {}", endpoint, e)))?;

        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| ApiError::Network(format!("Cannot extend URL for {}", endpoint)))?
                .pop_if_empty()
                .extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }
}

/// Map a raw response onto the success/error contract.
///
/// Error bodies yield `error`, then `message`, then a generic message.
/// Success bodies are unwrapped from `data` when present.
fn normalize_envelope<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
    if !status.is_success() {
        let body: ErrorBody = serde_json::from_slice(bytes).unwrap_or_default();
        let message = body
            .error
            .or(body.message)
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
        tracing::warn!("Backend rejected request ({}): {}", status, message);
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
            details: body.errors,
        });
    }

    let mut value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| ApiError::Parse(e.to_string()))?;

    let has_data = value.get("data").is_some_and(|data| !data.is_null());
    let payload = if has_data {
        value["data"].take()
    } else {
        value
    };

    serde_json::from_value(payload).map_err(|e| ApiError::Parse(e.to_string()))
}
