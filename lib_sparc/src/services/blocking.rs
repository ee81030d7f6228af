//! # Blocking Metadata Client
//!
//! Wraps a `MetadataClient` and a current-thread `tokio` runtime so that
//! synchronous programs can list and search datasets. Each call blocks the
//! calling thread until the request and its retries are done.
//!
//! Do not use this type from inside an async runtime: `block_on` panics when
//! called from a runtime thread. Use `MetadataClient` there instead.

use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use super::metadata::{MetadataClient, QueryBody};
use crate::configs::MetadataConfig;
use crate::retrieve::RetryConfig;

/// Synchronous counterpart of `MetadataClient`.
#[derive(Debug)]
pub struct BlockingMetadataClient {
    inner: MetadataClient,
    runtime: Runtime,
}

impl BlockingMetadataClient {
    /// Creates a client with the default retry policy.
    ///
    /// # Errors
    /// Fails only if the internal runtime cannot be built.
    pub fn new(config: Option<&MetadataConfig>) -> std::io::Result<Self> {
        Self::with_retry(config, RetryConfig::default())
    }

    /// Creates a client with a custom retry policy.
    pub fn with_retry(config: Option<&MetadataConfig>, retry: RetryConfig) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: MetadataClient::with_retry(config, retry),
            runtime,
        })
    }

    /// The wrapped async client.
    pub fn inner(&self) -> &MetadataClient {
        &self.inner
    }

    /// See `MetadataClient::get_api_key`.
    pub fn get_api_key(&self) -> &str {
        self.inner.get_api_key()
    }

    /// See `MetadataClient::set_api_key`.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &str {
        self.inner.set_api_key(api_key)
    }

    /// See `MetadataClient::profile_name`.
    pub fn profile_name(&self) -> &str {
        self.inner.profile_name()
    }

    /// See `MetadataClient::fetch`.
    pub fn fetch(&self, url: &str, headers: Option<HeaderMap>) -> Value {
        self.runtime.block_on(self.inner.fetch(url, headers))
    }

    /// See `MetadataClient::submit_query`.
    pub fn submit_query(
        &self,
        url: &str,
        body: impl Into<QueryBody>,
        headers: Option<HeaderMap>,
    ) -> Value {
        self.runtime
            .block_on(self.inner.submit_query(url, body, headers))
    }

    /// See `MetadataClient::list_datasets`.
    pub fn list_datasets(&self, limit: Option<u32>, offset: Option<u32>) -> Value {
        self.runtime.block_on(self.inner.list_datasets(limit, offset))
    }

    /// See `MetadataClient::search_datasets`.
    pub fn search_datasets(&self, query: Option<QueryBody>) -> Value {
        self.runtime.block_on(self.inner.search_datasets(query))
    }
}
