//! # Configuration Modules
//!
//! This module aggregates the configuration sources of the metadata
//! services: in-memory maps, JSON5 files and environment variables.

/// Provides the metadata client configuration and its loaders.
pub mod config_metadata;

pub use config_metadata::{ConfigError, MetadataConfig};
