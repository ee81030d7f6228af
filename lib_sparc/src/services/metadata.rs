//! # SciCrunch Metadata Client
//!
//! Lists and searches SPARC dataset metadata through the SciCrunch
//! Elasticsearch API.
//!
//! ## Core Features:
//! - **Key management**: the `apikey` credential lives on the client
//!   instance and can be replaced at any time with `set_api_key`.
//! - **Resilient calls**: every request goes through an `ApiClient` session
//!   that retries the transient statuses with a linear backoff.
//! - **Empty on failure**: `fetch` and `submit_query` never return an error.
//!   Every failure is logged and turned into an empty JSON object, so an
//!   empty object means either "nothing found" or "the call failed".

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::configs::MetadataConfig;
use crate::retrieve::{ApiClient, ApiResponse, HttpError, RetryConfig};

/// Base URL of the SciCrunch Elasticsearch API.
pub const HOST_API: &str = "https://api.scicrunch.io/elastic/v1";

/// Search endpoint of the SPARC dataset index.
pub const SEARCH_URL: &str = "https://api.scicrunch.io/elastic/v1/SPARC_Algolia_pr/_search";

/// Marks a search URL served by the non-authenticated test backend.
pub const TEST_BACKEND_MARKER: &str = "pennsieve";

/// Query sent by `search_datasets` when none is given.
pub const MATCH_ALL_QUERY: &str = r#"{"query": { "match_all": {}}}"#;

/// Page size used by `list_datasets` when none is given.
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Page offset used by `list_datasets` when none is given.
pub const DEFAULT_LIST_OFFSET: u32 = 0;

const APIKEY_HEADER: &str = "apikey";
const ACCEPT_JSON: &str = "application/json; charset=utf-8";

/// The body of a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryBody {
    /// Raw JSON text, parsed before sending.
    Text(String),
    /// An already structured query.
    Json(Value),
}

impl QueryBody {
    /// Resolves the body to JSON. Unreadable text is logged and yields `None`.
    fn into_json(self) -> Option<Value> {
        match self {
            QueryBody::Json(value) => Some(value),
            QueryBody::Text(text) => match serde_json::from_str(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    error!(error = %e, "Elasticsearch query body can not be read");
                    None
                }
            },
        }
    }
}

impl From<&str> for QueryBody {
    fn from(text: &str) -> Self {
        QueryBody::Text(text.to_string())
    }
}

impl From<String> for QueryBody {
    fn from(text: String) -> Self {
        QueryBody::Text(text)
    }
}

impl From<Value> for QueryBody {
    fn from(value: Value) -> Self {
        QueryBody::Json(value)
    }
}

/// The value returned for every failed call.
fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// # Metadata Client
///
/// Holds the SciCrunch credential and the endpoints, and issues the list and
/// search calls.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    api_key: String,
    profile_name: String,
    host_api: String,
    search_url: String,
    http: ApiClient,
}

impl MetadataClient {
    /// Creates a client with the default retry policy.
    ///
    /// Without a configuration the key and profile are empty and every call
    /// will be rejected by the remote service. No network I/O happens here.
    pub fn new(config: Option<&MetadataConfig>) -> Self {
        Self::with_retry(config, RetryConfig::default())
    }

    /// Creates a client with a custom retry policy.
    pub fn with_retry(config: Option<&MetadataConfig>, retry: RetryConfig) -> Self {
        info!("Initializing SPARC metadata search services...");

        let (api_key, profile_name) = match config {
            Some(cfg) => {
                debug!("{}", cfg);
                let api_key = cfg.scicrunch_api_key.clone().unwrap_or_default();
                if api_key.is_empty() {
                    warn!("SciCrunch API Key: Not Found");
                } else {
                    info!("SciCrunch API Key: Found");
                }
                let profile_name = cfg.pennsieve_profile_name.clone().unwrap_or_default();
                info!("Profile: {}", profile_name);
                (api_key, profile_name)
            }
            None => {
                warn!("SciCrunch API Key: Not Found");
                info!("Profile: none");
                (String::new(), String::new())
            }
        };

        let host_api = config
            .and_then(|c| c.host_api.clone())
            .unwrap_or_else(|| HOST_API.to_string());
        let search_url = config
            .and_then(|c| c.search_url.clone())
            .unwrap_or_else(|| SEARCH_URL.to_string());

        Self {
            api_key,
            profile_name,
            host_api,
            search_url,
            http: ApiClient::new(retry),
        }
    }

    /// Returns the API key currently in use.
    pub fn get_api_key(&self) -> &str {
        &self.api_key
    }

    /// Replaces the API key and returns the new value. Empty keys are accepted.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &str {
        self.api_key = api_key.into();
        &self.api_key
    }

    /// Returns the Pennsieve profile name given at construction.
    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// REST services need no connection; returns the API base URL.
    pub fn connect(&self) -> &str {
        info!("Metadata REST services available...");
        &self.host_api
    }

    /// Returns the API base URL.
    pub fn info(&self) -> &str {
        &self.host_api
    }

    /// REST services hold no connection; returns the API base URL.
    pub fn close(&self) -> &str {
        &self.host_api
    }

    /// The search endpoint used by `list_datasets` and `search_datasets`.
    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// GETs `url` and returns the JSON body, or an empty object on failure.
    pub async fn fetch(&self, url: &str, headers: Option<HeaderMap>) -> Value {
        let result = self
            .http
            .request::<Value, Value>(Method::GET, url, headers, None)
            .await;
        Self::settle(url, result)
    }

    /// POSTs a JSON query to `url` and returns the JSON body, or an empty object on failure.
    ///
    /// A `QueryBody::Text` that is not valid JSON is logged and the request is
    /// sent without a body; the remote rejection then yields an empty object.
    pub async fn submit_query(
        &self,
        url: &str,
        body: impl Into<QueryBody>,
        headers: Option<HeaderMap>,
    ) -> Value {
        let body_json = body.into().into_json();
        let result = self
            .http
            .request::<Value, Value>(Method::POST, url, headers, body_json)
            .await;
        Self::settle(url, result)
    }

    /// Lists datasets, `limit` records starting at `offset` (defaults 10 and 0).
    pub async fn list_datasets(&self, limit: Option<u32>, offset: Option<u32>) -> Value {
        let list_url = self.list_url(
            limit.unwrap_or(DEFAULT_LIST_LIMIT),
            offset.unwrap_or(DEFAULT_LIST_OFFSET),
        );
        self.fetch(&list_url, Some(self.request_headers())).await
    }

    /// Searches datasets with an Elasticsearch query (defaults to match-all).
    pub async fn search_datasets(&self, query: Option<QueryBody>) -> Value {
        let query = query.unwrap_or_else(|| QueryBody::from(MATCH_ALL_QUERY));
        self.submit_query(&self.search_url, query, Some(self.request_headers()))
            .await
    }

    /// JSON content headers plus the current key.
    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        match HeaderValue::from_str(&self.api_key) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(APIKEY_HEADER), value);
            }
            // The request still goes out; the remote side rejects it.
            Err(e) => error!(error = %e, "SciCrunch API Key is not a valid header value"),
        }
        headers
    }

    /// The listing URL; the test backend does not take pagination parameters.
    ///
    /// `from` and `size` are appended after any query the search URL already
    /// carries. An unparsable search URL is returned as is and fails later.
    fn list_url(&self, limit: u32, offset: u32) -> String {
        if self.search_url.contains(TEST_BACKEND_MARKER) {
            return self.search_url.clone();
        }
        match Url::parse(&self.search_url) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("from", &offset.to_string())
                    .append_pair("size", &limit.to_string());
                url.into()
            }
            Err(_) => self.search_url.clone(),
        }
    }

    /// Logs any failure and collapses it into an empty object.
    fn settle(url: &str, result: Result<ApiResponse<Value>, HttpError>) -> Value {
        match result {
            Ok(response) if response.success => response.data.unwrap_or_else(empty_object),
            Ok(response) => {
                error!(
                    url,
                    status = response.status,
                    body = response.error_body.as_deref().unwrap_or(""),
                    "Retrieving URL - HTTP Error"
                );
                empty_object()
            }
            Err(e) => {
                let kind = match &e {
                    HttpError::Connect(_) => "Error Connecting",
                    HttpError::Timeout(_) => "Timeout Error",
                    HttpError::Decode(_) => "Invalid JSON Response",
                    _ => "Something Else",
                };
                error!(url, error = %e, "Retrieving URL - {}", kind);
                empty_object()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(search_url: Option<&str>) -> MetadataClient {
        let config = MetadataConfig {
            scicrunch_api_key: Some("key-1".into()),
            pennsieve_profile_name: Some("sparc".into()),
            host_api: None,
            search_url: search_url.map(str::to_string),
        };
        MetadataClient::new(Some(&config))
    }

    #[test]
    fn missing_config_leaves_key_and_profile_empty() {
        let client = MetadataClient::new(None);
        assert_eq!(client.get_api_key(), "");
        assert_eq!(client.profile_name(), "");
        assert_eq!(client.info(), HOST_API);
        assert_eq!(client.search_url(), SEARCH_URL);
    }

    #[test]
    fn config_values_are_taken_over() {
        let client = configured(None);
        assert_eq!(client.get_api_key(), "key-1");
        assert_eq!(client.profile_name(), "sparc");
        assert_eq!(client.connect(), HOST_API);
        assert_eq!(client.close(), HOST_API);
    }

    #[test]
    fn set_api_key_round_trips() {
        let mut client = configured(None);
        for key in ["other", "", "with spaces", "ünïcode"] {
            assert_eq!(client.set_api_key(key), key);
            assert_eq!(client.get_api_key(), key);
        }
    }

    #[test]
    fn headers_carry_json_types_and_current_key() {
        let mut client = configured(None);
        client.set_api_key("fresh");
        let headers = client.request_headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json; charset=utf-8");
        assert_eq!(headers["apikey"], "fresh");
    }

    #[test]
    fn unusable_key_is_left_out_of_headers() {
        let mut client = configured(None);
        client.set_api_key("bad\nkey");
        let headers = client.request_headers();
        assert!(!headers.contains_key("apikey"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn list_url_appends_pagination() {
        let client = configured(None);
        assert_eq!(
            client.list_url(25, 50),
            format!("{}?from=50&size=25", SEARCH_URL)
        );
    }

    #[test]
    fn list_url_keeps_existing_query() {
        let client = configured(Some("https://mirror/idx/_search?pretty=true"));
        assert_eq!(
            client.list_url(5, 0),
            "https://mirror/idx/_search?pretty=true&from=0&size=5"
        );
    }

    #[test]
    fn list_url_skips_pagination_on_test_backend() {
        let url = "https://pennsieve.example/idx/_search";
        let client = configured(Some(url));
        assert_eq!(client.list_url(25, 50), url);
    }

    #[test]
    fn query_text_is_parsed() {
        let body = QueryBody::from(MATCH_ALL_QUERY).into_json();
        assert_eq!(body, Some(serde_json::json!({"query": {"match_all": {}}})));
    }

    #[test]
    fn structured_query_is_kept() {
        let value = serde_json::json!({"size": 1});
        assert_eq!(QueryBody::from(value.clone()).into_json(), Some(value));
    }

    #[test]
    fn unreadable_query_text_yields_no_body() {
        assert_eq!(QueryBody::from("{not json").into_json(), None);
        assert_eq!(QueryBody::from(String::new()).into_json(), None);
    }
}
