//! # Logging Modules
//!
//! The library itself only emits `tracing` events. This module installs the
//! subscriber that applications use to collect them.

/// Console and rolling JSON file subscriber setup.
pub mod tracing_setup;

pub use tracing_setup::{setup_logging, LoggingError, LoggingOptions};
