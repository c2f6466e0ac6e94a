// tests/ingest_scheduler.rs
use std::time::Duration;

mod common;

use common::*;
use patchnote_ingest::ingest::scheduler::spawn_batch_scheduler;

#[tokio::test]
async fn scheduler_runs_repeated_batches_without_duplicates() {
    let h = harness(all_pages(), answering_model(), &["model-a"]);
    let handle = spawn_batch_scheduler(h.state.pipeline.clone(), Duration::from_millis(40));

    // First tick fires immediately; give it room for a few more.
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.abort();

    // One batch visits 3 listings + 3 articles.
    assert!(h.fetcher.call_count() >= 12, "calls: {}", h.fetcher.call_count());
    assert_eq!(h.store.len(), 3);
    assert_eq!(h.generator.attempted().len(), 3);
}
