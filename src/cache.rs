// src/cache.rs
//! Cache invalidation for views that render the newest patch notes.
//!
//! The pipeline invalidates once per batch through [`InvalidatorMux`]. Failures
//! are reported back to the caller, which only logs them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, PoisonError, RwLock};

use crate::store::{PatchNote, PatchNoteStore, StoreError};

/// View rendered by the landing page.
pub const LATEST_VIEW_PATH: &str = "/";

/// Number of notes the landing page shows.
pub const LATEST_VIEW_LIMIT: usize = 3;

#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, paths: &[&str]) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// In-process cache of the "latest patch notes" view.
pub struct LatestNotesCache {
    limit: usize,
    slot: RwLock<Slot>,
}

#[derive(Default)]
struct Slot {
    // Bumped by every clear; a load started under an older generation is discarded.
    generation: u64,
    view: Option<Vec<PatchNote>>,
}

impl LatestNotesCache {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            slot: RwLock::new(Slot::default()),
        }
    }

    pub fn is_warm(&self) -> bool {
        self.slot.read().map(|s| s.view.is_some()).unwrap_or(false)
    }

    /// Cached view, loading it from `store` on a miss. A load that races a
    /// `clear` is returned to its caller but not cached.
    pub async fn get_or_load(&self, store: &dyn PatchNoteStore) -> Result<Vec<PatchNote>, StoreError> {
        let started = {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = slot.view.as_ref() {
                return Ok(hit.clone());
            }
            slot.generation
        };

        let fresh = store.recent(self.limit).await?;
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == started {
            slot.view = Some(fresh.clone());
        } else {
            tracing::debug!("latest notes view changed during load; not caching");
        }
        Ok(fresh)
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.view = None;
    }
}

#[async_trait]
impl CacheInvalidator for LatestNotesCache {
    async fn invalidate(&self, paths: &[&str]) -> Result<()> {
        if paths.contains(&LATEST_VIEW_PATH) {
            self.clear();
            tracing::debug!("latest notes cache cleared");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "latest-notes"
    }
}

/// POSTs `{"paths": [...]}` to a revalidate hook (e.g. a front-end ISR endpoint).
pub struct WebhookInvalidator {
    url: String,
    token: Option<String>,
    client: Client,
}

impl WebhookInvalidator {
    pub fn new(url: String, token: Option<String>) -> Self {
        Self {
            url,
            token,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CacheInvalidator for WebhookInvalidator {
    async fn invalidate(&self, paths: &[&str]) -> Result<()> {
        let body = serde_json::json!({ "paths": paths });
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.send()
            .await
            .context("revalidate post")?
            .error_for_status()
            .context("revalidate non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Fan-out over several invalidators. Every target is attempted; the first
/// failure is returned after all have run.
#[derive(Default)]
pub struct InvalidatorMux {
    targets: Vec<Arc<dyn CacheInvalidator>>,
}

impl InvalidatorMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn CacheInvalidator>) -> Self {
        self.targets.push(target);
        self
    }
}

#[async_trait]
impl CacheInvalidator for InvalidatorMux {
    async fn invalidate(&self, paths: &[&str]) -> Result<()> {
        let mut first_err = None;
        for target in &self.targets {
            if let Err(e) = target.invalidate(paths).await {
                tracing::warn!(target_name = target.name(), error = ?e, "cache invalidation failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceTag;
    use crate::store::{MemoryStore, NewPatchNote};
    use chrono::Utc;
    use tokio::sync::Notify;

    struct Failing;

    #[async_trait]
    impl CacheInvalidator for Failing {
        async fn invalidate(&self, _paths: &[&str]) -> Result<()> {
            anyhow::bail!("cdn unreachable")
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn note(title: &str) -> NewPatchNote {
        NewPatchNote {
            source_tag: SourceTag::Lol,
            title: title.into(),
            source_url: "https://example.test".into(),
            original_text: String::new(),
            summary_text: String::new(),
            summary_model: None,
            summary_degraded: false,
            published_at: Utc::now(),
            published_at_estimated: false,
        }
    }

    /// `recent` reads its rows, then parks until released.
    #[derive(Default)]
    struct SlowReadStore {
        inner: MemoryStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PatchNoteStore for SlowReadStore {
        async fn insert(&self, note: NewPatchNote) -> Result<PatchNote, StoreError> {
            self.inner.insert(note).await
        }
        async fn latest_for(&self, tag: SourceTag) -> Result<Option<PatchNote>, StoreError> {
            self.inner.latest_for(tag).await
        }
        async fn get(&self, id: u64) -> Result<Option<PatchNote>, StoreError> {
            self.inner.get(id).await
        }
        async fn recent(&self, limit: usize) -> Result<Vec<PatchNote>, StoreError> {
            let rows = self.inner.recent(limit).await?;
            self.entered.notify_one();
            self.release.notified().await;
            Ok(rows)
        }
        async fn list_for(&self, tag: SourceTag, limit: usize) -> Result<Vec<PatchNote>, StoreError> {
            self.inner.list_for(tag, limit).await
        }
    }

    #[tokio::test]
    async fn latest_cache_serves_stale_until_invalidated() {
        let store = MemoryStore::new();
        let cache = LatestNotesCache::new(3);
        assert!(cache.get_or_load(&store).await.unwrap().is_empty());
        assert!(cache.is_warm());

        store.insert(note("25.1")).await.unwrap();
        assert!(cache.get_or_load(&store).await.unwrap().is_empty());

        cache.invalidate(&[LATEST_VIEW_PATH]).await.unwrap();
        assert!(!cache.is_warm());
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn load_racing_an_invalidation_is_not_cached() {
        let store = Arc::new(SlowReadStore::default());
        let cache = Arc::new(LatestNotesCache::new(3));

        let reader = {
            let (cache, store) = (cache.clone(), store.clone());
            tokio::spawn(async move { cache.get_or_load(store.as_ref()).await.unwrap().len() })
        };

        // Reader has its pre-batch rows; the batch inserts and invalidates now.
        store.entered.notified().await;
        store.insert(note("25.2")).await.unwrap();
        cache.invalidate(&[LATEST_VIEW_PATH]).await.unwrap();
        store.release.notify_one();

        assert_eq!(reader.await.unwrap(), 0);
        assert!(!cache.is_warm(), "pre-batch view must not be cached");

        store.release.notify_one();
        assert_eq!(cache.get_or_load(store.as_ref()).await.unwrap().len(), 1);
        assert!(cache.is_warm());
    }

    #[tokio::test]
    async fn mux_runs_every_target_and_reports_failure() {
        let cache = Arc::new(LatestNotesCache::new(3));
        let store = MemoryStore::new();
        cache.get_or_load(&store).await.unwrap();

        let mux = InvalidatorMux::new()
            .with(Arc::new(Failing))
            .with(cache.clone());
        assert!(mux.invalidate(&[LATEST_VIEW_PATH]).await.is_err());
        assert!(!cache.is_warm(), "later targets still run after a failure");
    }
}
