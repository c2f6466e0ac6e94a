// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::Pipeline;

/// Spawn an in-process trigger that runs one batch per tick (the first tick
/// fires immediately). Overlap with the HTTP trigger is safe: batches serialize
/// inside [`Pipeline::run_batch`].
pub fn spawn_batch_scheduler(pipeline: Arc<Pipeline>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let report = pipeline.run_batch().await;
            tracing::info!(
                target: "ingest",
                sources = report.results.len(),
                stored = report
                    .results
                    .iter()
                    .filter(|r| r.status.label() == "success")
                    .count(),
                "scheduled batch finished"
            );
        }
    })
}
