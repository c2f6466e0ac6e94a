// src/ingest/mod.rs
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod scheduler;
pub mod types;

pub use pipeline::{IngestError, Pipeline};
pub use types::{BatchReport, ExtractedArticle, IngestionStatus, SkipReason, SourceOutcome};
