// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceTag;

/// Detail-page data pulled out by the extractor, before summarization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub url: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
    /// Publish date was missing or unparseable and defaulted to ingestion time.
    pub published_at_estimated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    Duplicate,
}

/// Terminal outcome for one source in one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestionStatus {
    #[serde(rename_all = "camelCase")]
    Success {
        patch_note_id: u64,
        title: String,
        summary_degraded: bool,
    },
    Skipped {
        reason: SkipReason,
    },
    Error {
        error: String,
    },
}

impl IngestionStatus {
    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            IngestionStatus::Success { .. } => "success",
            IngestionStatus::Skipped {
                reason: SkipReason::NoData,
            } => "skipped_no_data",
            IngestionStatus::Skipped {
                reason: SkipReason::Duplicate,
            } => "skipped_duplicate",
            IngestionStatus::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub game: SourceTag,
    #[serde(flatten)]
    pub status: IngestionStatus,
}

/// JSON body returned to the scheduler after one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<SourceOutcome>,
}
