//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! Every request runs inside its own middleware session with linear backoff
//! retries, and the JSON response is returned together with the HTTP
//! transaction metadata.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::backoff::RetryConfig;

/// Errors raised while issuing a request or reading its response.
///
/// HTTP error statuses are not part of this enum: they come back as an
/// `ApiResponse` with `success == false`.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The target is not an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The remote host could not be reached.
    #[error("Error connecting: {0}")]
    Connect(String),

    /// The request or the response body timed out.
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Any other transport or middleware failure.
    #[error("Request error: {0}")]
    Request(String),

    /// The request body could not be serialized to JSON.
    #[error("Request body serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The response body is not the expected JSON.
    #[error("Response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::Connect(err.to_string())
        } else {
            HttpError::Request(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for HttpError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            // The retry middleware wraps the last failure once retries ran out.
            reqwest_middleware::Error::Middleware(e) => {
                match e.chain().find_map(|cause| cause.downcast_ref::<reqwest::Error>()) {
                    Some(inner) if inner.is_timeout() => HttpError::Timeout(e.to_string()),
                    Some(inner) if inner.is_connect() => HttpError::Connect(e.to_string()),
                    _ => e
                        .chain()
                        .find_map(|cause| cause.downcast_ref::<reqwest_middleware::Error>())
                        .and_then(|inner| match inner {
                            reqwest_middleware::Error::Reqwest(r) if r.is_timeout() => {
                                Some(HttpError::Timeout(e.to_string()))
                            }
                            reqwest_middleware::Error::Reqwest(r) if r.is_connect() => {
                                Some(HttpError::Connect(e.to_string()))
                            }
                            _ => None,
                        })
                        .unwrap_or_else(|| HttpError::Request(e.to_string())),
                }
            }
        }
    }
}

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with metadata about the
/// HTTP transaction, such as status codes and headers.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
    /// The headers returned by the server.
    pub headers: HeaderMap,
}

/// A retrying asynchronous HTTP client.
///
/// Holds a pooled `reqwest::Client`; each request wraps it in a fresh
/// `reqwest_middleware` session carrying the retry policy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Connection pool shared by all sessions.
    http: reqwest::Client,
    /// Retry parameters applied to every session.
    retry: RetryConfig,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl ApiClient {
    /// Creates a new `ApiClient` with the given retry configuration.
    pub fn new(retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            retry,
        }
    }

    /// The retry configuration used by every session.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Opens a session: the pooled client wrapped with the retry middleware.
    fn session(&self) -> ClientWithMiddleware {
        let middleware = RetryTransientMiddleware::new_with_policy_and_strategy(
            self.retry.policy(),
            self.retry.strategy(),
        );
        ClientBuilder::new(self.http.clone()).with(middleware).build()
    }

    /// Performs an HTTP request and handles the response.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb (GET, POST, etc.).
    /// * `url` - An absolute URL, query string included.
    /// * `headers` - Optional headers for this request.
    /// * `body` - Optional serializable object to send as the JSON body.
    ///
    /// # Errors
    /// Returns an `HttpError` if the URL is invalid, the body cannot be
    /// serialized, the transport fails after all retries, or a 2xx body is
    /// not valid JSON for `T`. Non-2xx statuses are returned as `Ok`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        url: &str,
        headers: Option<HeaderMap>,
        body: Option<B>,
    ) -> Result<ApiResponse<T>, HttpError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let full_url = Url::parse(url)?;
        let session = self.session();
        debug!(method = method.as_str(), url = full_url.as_str(), "sending request");
        let mut req = session.request(method, full_url);

        let has_content_type = headers
            .as_ref()
            .is_some_and(|h| h.contains_key(CONTENT_TYPE));
        if let Some(h) = headers {
            req = req.headers(h);
        }

        if let Some(b) = body {
            let json_body = serde_json::to_string(&b).map_err(HttpError::Serialize)?;
            if !has_content_type {
                req = req.header(CONTENT_TYPE, "application/json");
            }
            req = req.body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let resp_headers = response.headers().clone();

        if status.is_success() {
            let bytes = response.bytes().await?;
            let data = serde_json::from_slice::<T>(&bytes).map_err(HttpError::Decode)?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
                headers: resp_headers,
            })
        } else {
            // Keep the error body for diagnostics; a failed read is not fatal here.
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
                headers: resp_headers,
            })
        }
    }
}
