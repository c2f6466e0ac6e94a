use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if a recorder is already set.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("patchnote_batches_total", "Ingestion batches started");
    describe_counter!(
        "patchnote_source_outcomes_total",
        "Per-source batch outcomes, labelled by status"
    );
    describe_counter!(
        "patchnote_summary_fallbacks_total",
        "Summaries replaced by a text excerpt after every model failed"
    );
    describe_counter!("patchnote_fetch_errors_total", "Failed page fetches");
    describe_histogram!("patchnote_batch_ms", Unit::Milliseconds, "Batch wall time");
    describe_gauge!(
        "patchnote_last_batch_ts",
        Unit::Seconds,
        "Unix time of the last finished batch"
    );
}
