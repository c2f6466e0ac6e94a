use std::sync::Arc;

use anyhow::Context;

use crate::cache::{InvalidatorMux, LatestNotesCache, WebhookInvalidator, LATEST_VIEW_LIMIT};
use crate::config::{AiConfig, AppConfig};
use crate::ingest::fetch::HttpFetcher;
use crate::ingest::Pipeline;
use crate::source::SourceCatalog;
use crate::store::{JsonlStore, PatchNoteStore};
use crate::summarize::{build_generator, Summarizer};

/// Shared handles for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn PatchNoteStore>,
    pub latest: Arc<LatestNotesCache>,
    pub summarizer: Arc<Summarizer>,
    pub cron_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<Pipeline>,
        store: Arc<dyn PatchNoteStore>,
        latest: Arc<LatestNotesCache>,
        summarizer: Arc<Summarizer>,
        cron_secret: Option<String>,
    ) -> Self {
        Self {
            pipeline,
            store,
            latest,
            summarizer,
            cron_secret: cron_secret.map(Arc::from),
        }
    }

    /// One-time startup wiring: load configs, open the store (creating it if
    /// absent), build the pipeline. Safe to repeat against an existing store.
    pub async fn bootstrap(config: &AppConfig) -> anyhow::Result<Self> {
        let catalog = SourceCatalog::load_or_builtin(&config.sources_config_path)
            .context("loading source catalog")?;
        let ai = AiConfig::load_or_default(&config.ai_config_path).context("loading AI config")?;

        let store: Arc<dyn PatchNoteStore> = Arc::new(
            JsonlStore::open(&config.store_path)
                .await
                .context("opening patch note store")?,
        );
        let fetcher = Arc::new(HttpFetcher::new().context("building http client")?);

        let generator = build_generator(&ai);
        tracing::info!(
            provider = generator.provider_name(),
            models = ai.models.len(),
            key_len = ai.api_key.len(),
            "summarizer configured"
        );
        let summarizer = Arc::new(Summarizer::from_config(&ai, generator));

        let latest = Arc::new(LatestNotesCache::new(LATEST_VIEW_LIMIT));
        let mut invalidators = InvalidatorMux::new().with(latest.clone());
        if let Some(url) = &config.revalidate_webhook_url {
            invalidators = invalidators.with(Arc::new(WebhookInvalidator::new(
                url.clone(),
                config.revalidate_token.clone(),
            )));
        }

        let pipeline = Arc::new(
            Pipeline::new(
                catalog.sources,
                fetcher,
                summarizer.clone(),
                store.clone(),
                Arc::new(invalidators),
            )
            .with_limits(config.extract_limits),
        );

        Ok(Self::new(
            pipeline,
            store,
            latest,
            summarizer,
            config.cron_secret.clone(),
        ))
    }
}
