//! Patch-note ingestion service. Binary entrypoint.
//! Boots the Axum HTTP server and, optionally, the in-process batch scheduler.

use std::time::Duration;

use patchnote_ingest::config::AppConfig;
use patchnote_ingest::ingest::scheduler::spawn_batch_scheduler;
use patchnote_ingest::metrics::Metrics;
use patchnote_ingest::{init_tracing, router, AppState};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let state = AppState::bootstrap(&config).await?;

    if let Some(secs) = config.ingest_interval_secs {
        tracing::info!(interval_secs = secs, "starting in-process batch scheduler");
        spawn_batch_scheduler(state.pipeline.clone(), Duration::from_secs(secs));
    }

    let mut app = router(state);
    match Metrics::init() {
        Ok(metrics) => app = app.merge(metrics.router()),
        Err(e) => tracing::warn!(error = %e, "metrics recorder not installed; /metrics disabled"),
    }

    Ok(app.into())
}
