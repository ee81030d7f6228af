//! # Metadata Services
//!
//! Clients for the SciCrunch metadata search API.
//!
//! - **`metadata`**: the async `MetadataClient`.
//! - **`blocking`**: `BlockingMetadataClient`, the same operations for
//!   callers without an async runtime.

/// Async SciCrunch metadata client.
pub mod metadata;
/// Blocking facade over the metadata client.
pub mod blocking;

pub use blocking::BlockingMetadataClient;
pub use metadata::{MetadataClient, QueryBody};
