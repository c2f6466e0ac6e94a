// src/ingest/dedup.rs
use crate::source::SourceTag;
use crate::store::{PatchNoteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    Duplicate,
    Fresh,
}

/// Compare `title` against the most recent stored note for `tag` only.
///
/// Guards against back-to-back repeats (e.g. a site that hasn't published
/// anything new since the last run). A title seen earlier, with a different note
/// stored in between, is accepted again.
pub async fn check_duplicate(
    store: &dyn PatchNoteStore,
    tag: SourceTag,
    title: &str,
) -> Result<DedupVerdict, StoreError> {
    let verdict = match store.latest_for(tag).await? {
        Some(latest) if latest.title.as_bytes() == title.as_bytes() => DedupVerdict::Duplicate,
        _ => DedupVerdict::Fresh,
    };
    Ok(verdict)
}
