//! # Tracing Setup
//!
//! Configures the global `tracing` subscriber:
//! - The filter comes from `RUST_LOG`, falling back to the configured level.
//! - Console output goes to stderr, human-readable, with optional ANSI colors.
//! - When a log directory is given, events are also written as JSON lines to
//!   a daily rotating file through a non-blocking writer.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The level string is not a valid filter directive.
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// # Logging Options
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is not set (e.g. "info", "lib_sparc=debug").
    pub level: String,
    /// Directory for the JSON log files. `None` disables file output.
    pub log_dir: Option<PathBuf>,
    /// File name prefix of the daily log files.
    pub file_prefix: String,
    /// Colorize console output.
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            file_prefix: "sparc_metadata".to_string(),
            ansi: true,
        }
    }
}

/// Installs the global subscriber.
///
/// Returns the file writer's guard when file output is enabled. Buffered
/// events are flushed when the guard is dropped, so the caller keeps it alive
/// for the lifetime of the program.
pub fn setup_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>, LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.level))
        .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_ansi(options.ansi)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = rolling::daily(dir, &options.file_prefix);
            let (non_blocking_appender, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking_appender)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    info!("Logging initialized with level: {}", options.level);
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::error;

    #[test]
    fn writes_json_lines_and_refuses_second_install() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoggingOptions {
            log_dir: Some(dir.path().join("logs")),
            file_prefix: "unit".to_string(),
            ansi: false,
            ..Default::default()
        };

        let guard = setup_logging(&options).unwrap();
        assert!(guard.is_some());
        error!(marker = 7, "log file check");
        drop(guard);

        let entries: Vec<_> = fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("unit"), "unexpected file {name}");

        let contents = fs::read_to_string(&entries[0]).unwrap();
        assert!(contents.contains("log file check"));
        assert!(contents.contains("\"marker\":7"));

        let second = setup_logging(&LoggingOptions::default());
        assert!(matches!(second, Err(LoggingError::AlreadyInitialized(_))));
    }

    #[test]
    fn default_options_log_to_console_only() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "info");
        assert!(options.log_dir.is_none());
        assert!(options.ansi);
    }
}
