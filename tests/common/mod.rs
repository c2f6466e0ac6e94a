// tests/common/mod.rs
//
// Shared wiring for integration tests: the built-in source catalog served from
// HTML fixtures through StaticFetcher, an in-memory store and a scripted model.
#![allow(dead_code)]

use std::sync::Arc;

use patchnote_ingest::cache::{InvalidatorMux, LatestNotesCache, LATEST_VIEW_LIMIT};
use patchnote_ingest::ingest::extract::ExtractLimits;
use patchnote_ingest::ingest::fetch::StaticFetcher;
use patchnote_ingest::ingest::Pipeline;
use patchnote_ingest::source::{SourceCatalog, SourceProfile, SourceTag};
use patchnote_ingest::store::MemoryStore;
use patchnote_ingest::summarize::{Scripted, ScriptedGenerator, Summarizer};
use patchnote_ingest::AppState;

pub const LOL_LISTING: &str = include_str!("../fixtures/lol_listing.html");
pub const LOL_ARTICLE: &str = include_str!("../fixtures/lol_article.html");
pub const VALORANT_LISTING: &str = include_str!("../fixtures/valorant_listing.html");
pub const VALORANT_ARTICLE: &str = include_str!("../fixtures/valorant_article.html");
pub const PUBG_LISTING: &str = include_str!("../fixtures/pubg_listing.html");
pub const PUBG_LISTING_EMPTY: &str = include_str!("../fixtures/pubg_listing_empty.html");
pub const PUBG_ARTICLE: &str = include_str!("../fixtures/pubg_article.html");
pub const SHORT_PRIMARY_ARTICLE: &str = include_str!("../fixtures/short_primary_article.html");
pub const SHORT_EVERYWHERE_ARTICLE: &str =
    include_str!("../fixtures/short_everywhere_article.html");
pub const INLINE_MARKUP_ARTICLE: &str = include_str!("../fixtures/inline_markup_article.html");

pub const LOL_ARTICLE_URL: &str =
    "https://www.leagueoflegends.com/ko-kr/news/game-updates/patch-25-05-notes/";
pub const VALORANT_ARTICLE_URL: &str =
    "https://playvalorant.com/ko-kr/news/game-updates/valorant-patch-notes-10-04/";
pub const PUBG_ARTICLE_URL: &str = "https://pubg.com/ko/news/8123";

pub const CRON_SECRET: &str = "test-cron-secret";

pub fn profile(tag: SourceTag) -> SourceProfile {
    SourceCatalog::builtin()
        .sources
        .into_iter()
        .find(|p| p.tag == tag)
        .expect("builtin profile for every tag")
}

pub fn listing_url(tag: SourceTag) -> String {
    profile(tag).listing_url
}

/// Every listing and article page answering 200.
pub fn all_pages() -> StaticFetcher {
    StaticFetcher::new()
        .with_page(&listing_url(SourceTag::Lol), LOL_LISTING)
        .with_page(LOL_ARTICLE_URL, LOL_ARTICLE)
        .with_page(&listing_url(SourceTag::Valorant), VALORANT_LISTING)
        .with_page(VALORANT_ARTICLE_URL, VALORANT_ARTICLE)
        .with_page(&listing_url(SourceTag::Pubg), PUBG_LISTING)
        .with_page(PUBG_ARTICLE_URL, PUBG_ARTICLE)
}

/// Generator whose first model always answers.
pub fn answering_model() -> ScriptedGenerator {
    ScriptedGenerator::new().reply("model-a", Scripted::Text("요약된 패치 노트".into()))
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub fetcher: Arc<StaticFetcher>,
    pub generator: Arc<ScriptedGenerator>,
    pub latest: Arc<LatestNotesCache>,
}

pub fn harness_for(
    sources: Vec<SourceProfile>,
    fetcher: StaticFetcher,
    generator: ScriptedGenerator,
    models: &[&str],
) -> Harness {
    harness_with_limits(sources, fetcher, generator, models, ExtractLimits::default())
}

pub fn harness_with_limits(
    sources: Vec<SourceProfile>,
    fetcher: StaticFetcher,
    generator: ScriptedGenerator,
    models: &[&str],
    limits: ExtractLimits,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(fetcher);
    let generator = Arc::new(generator);
    let summarizer = Arc::new(Summarizer::new(generator.clone()).with_models(models.iter().copied()));
    let latest = Arc::new(LatestNotesCache::new(LATEST_VIEW_LIMIT));
    let invalidators = InvalidatorMux::new().with(latest.clone());

    let pipeline = Arc::new(
        Pipeline::new(
            sources,
            fetcher.clone(),
            summarizer.clone(),
            store.clone(),
            Arc::new(invalidators),
        )
        .with_limits(limits),
    );
    let state = AppState::new(
        pipeline,
        store.clone(),
        latest.clone(),
        summarizer,
        Some(CRON_SECRET.to_string()),
    );

    Harness {
        state,
        store,
        fetcher,
        generator,
        latest,
    }
}

/// All built-in sources with the given pages and generator.
pub fn harness(fetcher: StaticFetcher, generator: ScriptedGenerator, models: &[&str]) -> Harness {
    harness_for(SourceCatalog::builtin().sources, fetcher, generator, models)
}
