// src/ingest/pipeline.rs
use chrono::Utc;
use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheInvalidator, LATEST_VIEW_PATH};
use crate::ingest::dedup::{check_duplicate, DedupVerdict};
use crate::ingest::extract::{discover_article_link, extract_article, ExtractLimits};
use crate::ingest::fetch::{FetchError, PageFetcher};
use crate::ingest::types::{BatchReport, IngestionStatus, SkipReason, SourceOutcome};
use crate::source::SourceProfile;
use crate::store::{NewPatchNote, PatchNoteStore, StoreError};
use crate::summarize::Summarizer;

/// Per-source failure; converted to an `error` status, never propagated.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fetch → extract → dedup → summarize → store, for each source in order.
pub struct Pipeline {
    sources: Vec<SourceProfile>,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Arc<Summarizer>,
    store: Arc<dyn PatchNoteStore>,
    invalidator: Arc<dyn CacheInvalidator>,
    limits: ExtractLimits,
    // Serializes batches so an overlapping trigger sees the previous batch's inserts.
    batch_lock: tokio::sync::Mutex<()>,
}

impl Pipeline {
    pub fn new(
        sources: Vec<SourceProfile>,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<Summarizer>,
        store: Arc<dyn PatchNoteStore>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            sources,
            fetcher,
            summarizer,
            store,
            invalidator,
            limits: ExtractLimits::default(),
            batch_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Run one batch over every source. Never fails as a whole.
    pub async fn run_batch(&self) -> BatchReport {
        let _guard = self.batch_lock.lock().await;
        let t0 = std::time::Instant::now();
        counter!("patchnote_batches_total").increment(1);

        let mut results = Vec::with_capacity(self.sources.len());
        for profile in &self.sources {
            tracing::info!(source = %profile.tag, "patch note ingest started");
            let status = match self.ingest_source(profile).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(source = %profile.tag, error = %e, "patch note ingest failed");
                    IngestionStatus::Error {
                        error: e.to_string(),
                    }
                }
            };
            counter!("patchnote_source_outcomes_total", "status" => status.label()).increment(1);
            tracing::info!(source = %profile.tag, status = status.label(), "patch note ingest finished");
            results.push(SourceOutcome {
                game: profile.tag,
                status,
            });
        }

        if let Err(e) = self.invalidator.invalidate(&[LATEST_VIEW_PATH]).await {
            tracing::error!(error = ?e, "cache invalidation failed after batch");
        } else {
            tracing::info!("latest view caches invalidated");
        }

        let now = Utc::now();
        histogram!("patchnote_batch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!("patchnote_last_batch_ts").set(now.timestamp() as f64);

        BatchReport {
            success: true,
            timestamp: now,
            results,
        }
    }

    async fn ingest_source(&self, profile: &SourceProfile) -> Result<IngestionStatus, IngestError> {
        let tag = profile.tag;

        let listing = self.fetcher.fetch(&profile.listing_url).await?;
        let Some(article_url) = discover_article_link(&listing, profile) else {
            tracing::info!(source = %tag, "no article link on listing page");
            return Ok(IngestionStatus::Skipped {
                reason: SkipReason::NoData,
            });
        };

        let page = self.fetcher.fetch(&article_url).await?;
        let Some(article) = extract_article(&page, &article_url, profile, &self.limits, Utc::now())
        else {
            tracing::info!(source = %tag, url = %article_url, "article page yielded no content");
            return Ok(IngestionStatus::Skipped {
                reason: SkipReason::NoData,
            });
        };

        if check_duplicate(self.store.as_ref(), tag, &article.title).await? == DedupVerdict::Duplicate {
            tracing::info!(source = %tag, title = %article.title, "duplicate patch note");
            return Ok(IngestionStatus::Skipped {
                reason: SkipReason::Duplicate,
            });
        }
        tracing::info!(source = %tag, title = %article.title, "new patch note found");

        let summary = self.summarizer.summarize(tag, &article.body).await;

        let saved = self
            .store
            .insert(NewPatchNote {
                source_tag: tag,
                title: article.title,
                source_url: article.url,
                original_text: article.body,
                summary_text: summary.text,
                summary_model: summary.model,
                summary_degraded: summary.degraded,
                published_at: article.published_at,
                published_at_estimated: article.published_at_estimated,
            })
            .await?;

        tracing::info!(source = %tag, id = saved.id, "patch note stored");
        Ok(IngestionStatus::Success {
            patch_note_id: saved.id,
            title: saved.title,
            summary_degraded: saved.summary_degraded,
        })
    }
}
