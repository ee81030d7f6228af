//! # Data Retrieval Module
//!
//! This module provides the HTTP plumbing used by the metadata services:
//! request building, JSON response handling and the retry policy.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A generic HTTP `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`. Each request runs in a fresh session carrying the
//!   retry middleware.
//! - **`backoff`**: The linear backoff policy and the status code allow-list
//!   plugged into `reqwest-retry`.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Linear backoff policy and retryable status list.
pub mod backoff;
/// Generic HTTP API client with retry middleware.
pub mod ky_http;

pub use backoff::RetryConfig;
pub use ky_http::{ApiClient, ApiResponse, HttpError};
