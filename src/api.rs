use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::ingest::BatchReport;
use crate::source::{SourceTag, UnknownSourceTag};
use crate::state::AppState;
use crate::store::PatchNote;

pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const MAX_LIST_LIMIT: usize = 100;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/cron/patch-note", get(cron_patch_note))
        .route("/api/patchnotes", get(list_patch_notes))
        .route("/api/patchnotes/latest", get(latest_patch_notes))
        .route("/api/patchnotes/{id}", get(get_patch_note))
        .route("/api/summarize", post(summarize))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Constant-length comparison of the presented header against `Bearer <secret>`.
/// An unset secret never matches.
pub(crate) fn bearer_matches(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(presented) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let expected = format!("Bearer {secret}");
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

async fn cron_patch_note(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BatchReport>, AppError> {
    if !bearer_matches(&headers, state.cron_secret.as_deref()) {
        tracing::warn!("cron trigger rejected");
        return Err(AppError::Unauthorized);
    }
    Ok(Json(state.pipeline.run_batch().await))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    game: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

async fn list_patch_notes(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<PatchNote>>, AppError> {
    let limit = q.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let notes = match q.game.as_deref().filter(|g| !g.is_empty()) {
        Some(raw) => {
            let tag: SourceTag = raw
                .parse()
                .map_err(|e: UnknownSourceTag| AppError::BadRequest(e.to_string()))?;
            state.store.list_for(tag, limit).await?
        }
        None => state.store.recent(limit).await?,
    };
    Ok(Json(notes))
}

async fn latest_patch_notes(State(state): State<AppState>) -> Result<Json<Vec<PatchNote>>, AppError> {
    Ok(Json(state.latest.get_or_load(state.store.as_ref()).await?))
}

async fn get_patch_note(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PatchNote>, AppError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

#[derive(Deserialize)]
struct SummarizeReq {
    #[serde(default)]
    content: String,
    game: SourceTag,
}

#[derive(Serialize)]
struct SummarizeResp {
    summary: String,
    model: String,
}

async fn summarize(
    State(state): State<AppState>,
    Json(body): Json<SummarizeReq>,
) -> Result<Json<SummarizeResp>, AppError> {
    if body.content.trim().is_empty() {
        return Err(AppError::BadRequest("content is required".into()));
    }
    match state.summarizer.try_summarize(body.game, &body.content).await {
        Ok(g) => Ok(Json(SummarizeResp {
            summary: g.text,
            model: g.model,
        })),
        Err(e) => {
            tracing::error!(game = %body.game, error = %e, "on-demand summary failed");
            Err(AppError::SummaryUnavailable {
                tried: e.tried().to_vec(),
                last: e.to_string(),
            })
        }
    }
}
