//! # Metadata Client Live Smoke Test
//!
//! Runs the `MetadataClient` against the real SciCrunch Elasticsearch API.
//! The key is read from `SCICRUNCH_API_KEY` (or a `.env` file).
//!
//! Because failures come back as an empty object, each step checks that
//! the answer carries Elasticsearch `hits`.

use anyhow::{bail, Result};
use serde_json::{json, Value};

use lib_sparc::loggers::{setup_logging, LoggingOptions};
use lib_sparc::{MetadataClient, MetadataConfig, QueryBody};

fn hit_count(value: &Value) -> Option<usize> {
    value["hits"]["hits"].as_array().map(|hits| hits.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = setup_logging(&LoggingOptions::default())?;

    let config = MetadataConfig::from_env();
    println!("{}", config);
    if config.scicrunch_api_key.as_deref().unwrap_or("").is_empty() {
        bail!("SCICRUNCH_API_KEY is not set");
    }
    let client = MetadataClient::new(Some(&config));
    println!("--- Starting Metadata Live Tests against {} ---", client.connect());

    // --- TEST 1: Paged listing ---
    println!("\n[Test 1] Listing 5 datasets from offset 0...");
    let page = client.list_datasets(Some(5), Some(0)).await;
    match hit_count(&page) {
        Some(n) if n <= 5 => println!("✅ Listed {} datasets", n),
        _ => bail!("Listing returned no hits: {}", page),
    }

    // --- TEST 2: Default match-all search ---
    println!("\n[Test 2] Match-all search...");
    let all = client.search_datasets(None).await;
    match hit_count(&all) {
        Some(n) => println!("✅ Match-all returned {} hits", n),
        None => bail!("Match-all search returned no hits: {}", all),
    }

    // --- TEST 3: Structured query ---
    println!("\n[Test 3] Keyword search for 'heart'...");
    let query = json!({"size": 3, "query": {"query_string": {"query": "heart"}}});
    let found = client.search_datasets(Some(QueryBody::from(query))).await;
    match hit_count(&found) {
        Some(n) => println!("✅ Keyword search returned {} hits", n),
        None => bail!("Keyword search returned no hits: {}", found),
    }

    println!("\n--- All Tests Passed Successfully ---");
    Ok(())
}
