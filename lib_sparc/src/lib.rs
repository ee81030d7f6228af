//! # lib_sparc
//!
//! Client library for the SPARC dataset metadata search services.
//!
//! Each top-level folder is a cargo feature:
//! - **`configs`**: `MetadataConfig` loaders (map, JSON5 file, environment).
//! - **`loggers`**: `tracing` subscriber setup for applications.
//! - **`retrieve`**: the retrying HTTP client.
//! - **`services`**: `MetadataClient` and `BlockingMetadataClient`.

#![forbid(unsafe_code)]

#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;
#[cfg(feature = "services")]
pub mod services;

// Re-export the main entry points
#[cfg(feature = "configs")]
pub use configs::MetadataConfig;
#[cfg(feature = "retrieve")]
pub use retrieve::RetryConfig;
#[cfg(feature = "services")]
pub use services::{BlockingMetadataClient, MetadataClient, QueryBody};
