//! # sparc-metadata
//!
//! Command-line front end for the SciCrunch metadata search API. Lists or
//! searches SPARC datasets and prints the JSON answer on stdout.
//!
//! Configuration is layered: command-line flags, then the JSON5 file given
//! with `--config`, then the environment (a `.env` file is honoured).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use lib_sparc::loggers::{setup_logging, LoggingOptions};
use lib_sparc::{MetadataClient, MetadataConfig, QueryBody};

/// List and search SPARC dataset metadata.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON5 configuration file with `scicrunch_api_key` and `pennsieve_profile_name`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SciCrunch API key. Overrides the configuration file and SCICRUNCH_API_KEY.
    #[arg(long)]
    api_key: Option<String>,

    /// Log filter used when RUST_LOG is not set. Logs go to stderr.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Output minified JSON (without pretty-printing).
    #[arg(short, long)]
    minify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List datasets page by page.
    List {
        /// Max number of datasets returned.
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        /// Offset used for pagination of results.
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
    },
    /// Search datasets with an Elasticsearch JSON query (match-all by default).
    Search {
        /// The query as a JSON string.
        #[arg(short, long, conflicts_with = "query_file")]
        query: Option<String>,
        /// A file holding the JSON query.
        #[arg(long)]
        query_file: Option<PathBuf>,
    },
}

fn load_config(args: &Args) -> Result<MetadataConfig> {
    layered_config(args, MetadataConfig::from_env())
}

/// Flags win over the `--config` file, which wins over `from_env`.
fn layered_config(args: &Args, from_env: MetadataConfig) -> Result<MetadataConfig> {
    let from_file = match &args.config {
        Some(path) => MetadataConfig::from_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => MetadataConfig::default(),
    };
    let from_flags = MetadataConfig {
        scicrunch_api_key: args.api_key.clone(),
        ..Default::default()
    };
    Ok(from_flags.merged_with(from_file).merged_with(from_env))
}

fn render(value: &Value, minify: bool) -> Result<String> {
    let text = if minify {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = setup_logging(&LoggingOptions {
        level: args.log_level.clone(),
        ..Default::default()
    })?;

    let config = load_config(&args)?;
    let client = MetadataClient::new(Some(&config));

    let result = match &args.command {
        Command::List { limit, offset } => client.list_datasets(Some(*limit), Some(*offset)).await,
        Command::Search { query, query_file } => {
            let body = match (query, query_file) {
                (Some(text), _) => Some(QueryBody::from(text.as_str())),
                (None, Some(path)) => Some(QueryBody::from(
                    fs::read_to_string(path)
                        .with_context(|| format!("Failed to read query {}", path.display()))?,
                )),
                (None, None) => None,
            };
            client.search_datasets(body).await
        }
    };

    println!("{}", render(&result, args.minify)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_layer() -> MetadataConfig {
        MetadataConfig::from_vars([
            ("SCICRUNCH_API_KEY", "env-key"),
            ("PENNSIEVE_PROFILE_NAME", "env-profile"),
        ])
    }

    fn config_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", text).unwrap();
        file
    }

    #[test]
    fn config_file_wins_over_environment() {
        let file = config_file("{ scicrunch_api_key: 'file-key' }");
        let path = file.path().to_str().unwrap();
        let args = Args::parse_from(["sparc-metadata", "--config", path, "list"]);

        let config = layered_config(&args, env_layer()).unwrap();
        assert_eq!(config.scicrunch_api_key.as_deref(), Some("file-key"));
        assert_eq!(config.pennsieve_profile_name.as_deref(), Some("env-profile"));
    }

    #[test]
    fn api_key_flag_wins_over_file_and_environment() {
        let file = config_file("{ scicrunch_api_key: 'file-key' }");
        let path = file.path().to_str().unwrap();
        let args = Args::parse_from([
            "sparc-metadata", "--config", path, "--api-key", "flag-key", "list",
        ]);

        let config = layered_config(&args, env_layer()).unwrap();
        assert_eq!(config.scicrunch_api_key.as_deref(), Some("flag-key"));
    }

    #[test]
    fn environment_fills_in_without_file_or_flag() {
        let args = Args::parse_from(["sparc-metadata", "list"]);
        let config = layered_config(&args, env_layer()).unwrap();
        assert_eq!(config.scicrunch_api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn unreadable_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json5");
        let args = Args::parse_from(["sparc-metadata", "--config", missing.to_str().unwrap(), "list"]);
        assert!(layered_config(&args, MetadataConfig::default()).is_err());
    }

    #[test]
    fn search_query_and_query_file_conflict() {
        let parsed = Args::try_parse_from([
            "sparc-metadata", "search", "--query", "{}", "--query-file", "q.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn render_minifies_on_request() {
        let value = serde_json::json!({"hits": {"total": 1}});
        assert_eq!(render(&value, true).unwrap(), r#"{"hits":{"total":1}}"#);
        assert!(render(&value, false).unwrap().contains('\n'));
    }
}
