// tests/metrics.rs
//
// One batch through the pipeline shows up on /metrics. The recorder is global,
// so this binary installs it exactly once.

mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use common::*;
use patchnote_ingest::metrics::Metrics;
use patchnote_ingest::summarize::ScriptedGenerator;
use tower::ServiceExt;

#[tokio::test]
async fn metrics_endpoint_contains_batch_series() {
    let metrics = Metrics::init().expect("install recorder");
    // No scripted replies: every model is missing, so each source degrades.
    let h = harness(all_pages(), ScriptedGenerator::new(), &["m1"]);
    h.state.pipeline.run_batch().await;

    let app = patchnote_ingest::router(h.state).merge(metrics.router());
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "patchnote_batches_total 1",
        r#"patchnote_source_outcomes_total{status="success"} 3"#,
        "patchnote_summary_fallbacks_total 3",
        "patchnote_batch_ms",
        "patchnote_last_batch_ts",
    ] {
        assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
    }
}
