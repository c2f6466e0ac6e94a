//! Run a single ingestion batch against the configured sources and print the
//! report as JSON. Useful for checking selectors against live pages.
//!
//! Usage: `cargo run --bin ingest_once`

use patchnote_ingest::config::AppConfig;
use patchnote_ingest::{init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let state = AppState::bootstrap(&config).await?;
    let report = state.pipeline.run_batch().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
