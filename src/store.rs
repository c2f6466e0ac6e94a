//! Append-only patch-note persistence.
//!
//! Two backends share the [`PatchNoteStore`] trait: an in-memory vector (tests,
//! ephemeral deployments) and a JSON-lines file replayed on open.
//! Records are never updated or deleted here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::source::SourceTag;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchNote {
    pub id: u64,
    pub source_tag: SourceTag,
    pub title: String,
    pub source_url: String,
    pub original_text: String,
    pub summary_text: String,
    #[serde(default)]
    pub summary_model: Option<String>,
    #[serde(default)]
    pub summary_degraded: bool,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at_estimated: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatchNote {
    pub source_tag: SourceTag,
    pub title: String,
    pub source_url: String,
    pub original_text: String,
    pub summary_text: String,
    pub summary_model: Option<String>,
    pub summary_degraded: bool,
    pub published_at: DateTime<Utc>,
    pub published_at_estimated: bool,
}

impl NewPatchNote {
    fn into_record(self, id: u64, created_at: DateTime<Utc>) -> PatchNote {
        PatchNote {
            id,
            source_tag: self.source_tag,
            title: self.title,
            source_url: self.source_url,
            original_text: self.original_text,
            summary_text: self.summary_text,
            summary_model: self.summary_model,
            summary_degraded: self.summary_degraded,
            published_at: self.published_at,
            published_at_estimated: self.published_at_estimated,
            created_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding patch note: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait PatchNoteStore: Send + Sync {
    async fn insert(&self, note: NewPatchNote) -> Result<PatchNote, StoreError>;
    /// Most recently inserted record for `tag`.
    async fn latest_for(&self, tag: SourceTag) -> Result<Option<PatchNote>, StoreError>;
    async fn get(&self, id: u64) -> Result<Option<PatchNote>, StoreError>;
    /// Newest first across all tags.
    async fn recent(&self, limit: usize) -> Result<Vec<PatchNote>, StoreError>;
    /// Newest first for one tag.
    async fn list_for(&self, tag: SourceTag, limit: usize) -> Result<Vec<PatchNote>, StoreError>;
}

/// Shared read logic over an insertion-ordered slice.
fn newest_first<'a>(
    rows: &'a [PatchNote],
    tag: Option<SourceTag>,
) -> impl Iterator<Item = &'a PatchNote> + 'a {
    rows.iter()
        .rev()
        .filter(move |n| tag.map_or(true, |t| n.source_tag == t))
}

// ------------------------------------------------------------
// In-memory
// ------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<PatchNote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<PatchNote> {
        self.rows.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl PatchNoteStore for MemoryStore {
    async fn insert(&self, note: NewPatchNote) -> Result<PatchNote, StoreError> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        let id = rows.last().map(|n| n.id + 1).unwrap_or(1);
        let record = note.into_record(id, Utc::now());
        rows.push(record.clone());
        Ok(record)
    }

    async fn latest_for(&self, tag: SourceTag) -> Result<Option<PatchNote>, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        let hit = newest_first(&rows, Some(tag)).next().cloned();
        Ok(hit)
    }

    async fn get(&self, id: u64) -> Result<Option<PatchNote>, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        let hit = rows.iter().find(|n| n.id == id).cloned();
        Ok(hit)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PatchNote>, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        let view = newest_first(&rows, None).take(limit).cloned().collect();
        Ok(view)
    }

    async fn list_for(&self, tag: SourceTag, limit: usize) -> Result<Vec<PatchNote>, StoreError> {
        let rows = self.rows.lock().expect("store mutex poisoned");
        let view = newest_first(&rows, Some(tag)).take(limit).cloned().collect();
        Ok(view)
    }
}

// ------------------------------------------------------------
// JSON-lines file
// ------------------------------------------------------------

struct JsonlInner {
    file: tokio::fs::File,
    rows: Vec<PatchNote>,
    // Last line on disk is unterminated (crash or failed write); the next
    // append starts with a newline so the fragment stays on its own line.
    needs_newline: bool,
}

/// Append-only JSON-lines file. Every record is also held in memory for reads.
pub struct JsonlStore {
    path: PathBuf,
    inner: tokio::sync::Mutex<JsonlInner>,
}

impl JsonlStore {
    /// Open (or create) the file and replay existing records. Malformed lines
    /// are logged and skipped.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut rows = Vec::new();
        let mut needs_newline = false;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                needs_newline = !content.is_empty() && !content.ends_with('\n');
                for (lineno, line) in content.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<PatchNote>(line) {
                        Ok(note) => rows.push(note),
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            line = lineno + 1,
                            error = %e,
                            "skipping malformed patch note line"
                        ),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;

        tracing::info!(path = %path.display(), records = rows.len(), "patch note store opened");
        Ok(Self {
            path,
            inner: tokio::sync::Mutex::new(JsonlInner {
                file,
                rows,
                needs_newline,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PatchNoteStore for JsonlStore {
    async fn insert(&self, note: NewPatchNote) -> Result<PatchNote, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.rows.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let record = note.into_record(id, Utc::now());

        let mut line = String::new();
        if inner.needs_newline {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(&record)?);
        line.push('\n');

        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        // A partial write may leave a fragment; assume it did until the flush succeeds.
        inner.needs_newline = true;
        inner.file.write_all(line.as_bytes()).await.map_err(io_err)?;
        inner.file.flush().await.map_err(io_err)?;
        inner.needs_newline = false;

        inner.rows.push(record.clone());
        Ok(record)
    }

    async fn latest_for(&self, tag: SourceTag) -> Result<Option<PatchNote>, StoreError> {
        let inner = self.inner.lock().await;
        let hit = newest_first(&inner.rows, Some(tag)).next().cloned();
        Ok(hit)
    }

    async fn get(&self, id: u64) -> Result<Option<PatchNote>, StoreError> {
        let inner = self.inner.lock().await;
        let hit = inner.rows.iter().find(|n| n.id == id).cloned();
        Ok(hit)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PatchNote>, StoreError> {
        let inner = self.inner.lock().await;
        let view = newest_first(&inner.rows, None).take(limit).cloned().collect();
        Ok(view)
    }

    async fn list_for(&self, tag: SourceTag, limit: usize) -> Result<Vec<PatchNote>, StoreError> {
        let inner = self.inner.lock().await;
        let view = newest_first(&inner.rows, Some(tag)).take(limit).cloned().collect();
        Ok(view)
    }
}
