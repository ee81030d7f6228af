//! # Metadata Service Configuration
//!
//! Settings for the SciCrunch metadata client: the API key, the Pennsieve
//! profile the key belongs to, and optional endpoint overrides. The values
//! can come from an in-memory map, a JSON5 file or the process environment.

use std::collections::BTreeMap;
use std::path::Path;
use std::{env, fmt, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Map key and JSON5 field holding the SciCrunch API key.
pub const KEY_API_KEY: &str = "scicrunch_api_key";
/// Map key and JSON5 field holding the Pennsieve profile name.
pub const KEY_PROFILE_NAME: &str = "pennsieve_profile_name";
/// Map key and JSON5 field overriding the API base URL.
pub const KEY_HOST_API: &str = "host_api";
/// Map key and JSON5 field overriding the search endpoint.
pub const KEY_SEARCH_URL: &str = "search_url";

/// Environment variable for the API key.
pub const ENV_API_KEY: &str = "SCICRUNCH_API_KEY";
/// Environment variable for the profile name.
pub const ENV_PROFILE_NAME: &str = "PENNSIEVE_PROFILE_NAME";
/// Environment variable overriding the API base URL.
pub const ENV_HOST_API: &str = "SPARC_METADATA_HOST_API";
/// Environment variable overriding the search endpoint.
pub const ENV_SEARCH_URL: &str = "SPARC_METADATA_SEARCH_URL";

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration text is not valid JSON5 for `MetadataConfig`.
    #[error("JSON5 parse error: {0}")]
    Json5Error(String),
}

/// # Metadata Configuration
///
/// Every field is optional. A missing key is not an error here; the remote
/// service rejects the requests instead.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Credential sent as the `apikey` header.
    pub scicrunch_api_key: Option<String>,
    /// Pennsieve profile associated with the key.
    pub pennsieve_profile_name: Option<String>,
    /// Base URL of the Elasticsearch API.
    pub host_api: Option<String>,
    /// Full URL of the dataset search endpoint.
    pub search_url: Option<String>,
}

impl MetadataConfig {
    /// Builds a configuration from a key/value mapping. Unknown keys are ignored.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            scicrunch_api_key: map.get(KEY_API_KEY).cloned(),
            pennsieve_profile_name: map.get(KEY_PROFILE_NAME).cloned(),
            host_api: map.get(KEY_HOST_API).cloned(),
            search_url: map.get(KEY_SEARCH_URL).cloned(),
        }
    }

    /// Parses a JSON5 document.
    pub fn from_json5_str(text: &str) -> Result<Self, ConfigError> {
        json5::from_str(text).map_err(|e| ConfigError::Json5Error(e.to_string()))
    }

    /// Reads and parses a JSON5 file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json5_str(&text)
    }

    /// Builds a configuration from `(name, value)` pairs shaped like environment variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (name, value) in vars {
            let slot = match name.as_ref() {
                ENV_API_KEY => &mut config.scicrunch_api_key,
                ENV_PROFILE_NAME => &mut config.pennsieve_profile_name,
                ENV_HOST_API => &mut config.host_api,
                ENV_SEARCH_URL => &mut config.search_url,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        config
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        // A missing .env file is the normal case.
        dotenvy::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Fills every unset field from `other`.
    pub fn merged_with(mut self, other: MetadataConfig) -> Self {
        self.scicrunch_api_key = self.scicrunch_api_key.or(other.scicrunch_api_key);
        self.pennsieve_profile_name = self.pennsieve_profile_name.or(other.pennsieve_profile_name);
        self.host_api = self.host_api.or(other.host_api);
        self.search_url = self.search_url.or(other.search_url);
        self
    }
}

impl fmt::Display for MetadataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.scicrunch_api_key.as_deref() {
            Some(k) if !k.is_empty() => "Found",
            _ => "Not Found",
        };
        write!(
            f,
            "MetadataConfig
    SciCrunch API Key: {},
    Profile: {},
    Host API: {},
    Search URL: {}
",
            key,
            self.pennsieve_profile_name.as_deref().unwrap_or("none"),
            self.host_api.as_deref().unwrap_or("default"),
            self.search_url.as_deref().unwrap_or("default"),
        )
    }
}
