//! # Sources
//!
//! The closed set of game news sources and, for each one, the data that drives
//! extraction: listing URL, ordered link-discovery strategies, title selectors,
//! body selector tiers and publish-date sources.
//!
//! Profiles are plain data so a source can be retuned (or a selector swapped after
//! a site redesign) from `config/sources.toml` without touching control flow.
//! Falls back to `SourceCatalog::builtin()` when no override file exists.

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};
use thiserror::Error;

/// Fixed identifier for one external game/news source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Lol,
    Valorant,
    Pubg,
}

impl SourceTag {
    pub const ALL: [SourceTag; 3] = [SourceTag::Lol, SourceTag::Valorant, SourceTag::Pubg];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Lol => "lol",
            SourceTag::Valorant => "valorant",
            SourceTag::Pubg => "pubg",
        }
    }

    /// Human-facing game name used in prompts and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceTag::Lol => "League of Legends",
            SourceTag::Valorant => "VALORANT",
            SourceTag::Pubg => "PUBG: BATTLEGROUNDS",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown source tag: {0}")]
pub struct UnknownSourceTag(pub String);

impl FromStr for SourceTag {
    type Err = UnknownSourceTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lol" => Ok(SourceTag::Lol),
            "valorant" => Ok(SourceTag::Valorant),
            "pubg" => Ok(SourceTag::Pubg),
            other => Err(UnknownSourceTag(other.to_string())),
        }
    }
}

/// One way of finding the detail-article link on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkStrategy {
    /// Anchors matched directly by a CSS selector, in document order.
    Selector { css: String },
    /// Any `a[href]` whose href contains one of the keywords (case-insensitive).
    HrefKeywords { keywords: Vec<String> },
    /// The first `a[href]` inside the first element matching `container`.
    FirstLinkIn { container: String },
}

/// An element selector plus the attribute that carries a publish date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSource {
    pub css: String,
    pub attr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub tag: SourceTag,
    pub listing_url: String,
    #[serde(default = "default_link_strategies")]
    pub link_strategies: Vec<LinkStrategy>,
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,
    /// Ordered container tiers; each tier is an ordered selector list.
    #[serde(default = "default_body_tiers")]
    pub body_tiers: Vec<Vec<String>>,
    #[serde(default = "default_date_sources")]
    pub date_sources: Vec<DateSource>,
}

fn default_link_strategies() -> Vec<LinkStrategy> {
    vec![
        LinkStrategy::Selector {
            css: r#"a[href*="patch-notes"]"#.to_string(),
        },
        LinkStrategy::HrefKeywords {
            keywords: vec!["patch".to_string(), "update".to_string()],
        },
        LinkStrategy::FirstLinkIn {
            container: "article".to_string(),
        },
    ]
}

fn default_title_selectors() -> Vec<String> {
    strings(&["h1", ".article-title", ".title", "title"])
}

fn default_body_tiers() -> Vec<Vec<String>> {
    vec![
        strings(&["article", ".article-content", ".post-content"]),
        strings(&["main", ".content", "#content"]),
    ]
}

fn default_date_sources() -> Vec<DateSource> {
    vec![
        DateSource {
            css: "time[datetime]".to_string(),
            attr: "datetime".to_string(),
        },
        DateSource {
            css: "[datetime]".to_string(),
            attr: "datetime".to_string(),
        },
        DateSource {
            css: r#"meta[property="article:published_time"]"#.to_string(),
            attr: "content".to_string(),
        },
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl SourceProfile {
    /// Profile with the default heuristics for the given listing page.
    pub fn new(tag: SourceTag, listing_url: impl Into<String>) -> Self {
        Self {
            tag,
            listing_url: listing_url.into(),
            link_strategies: default_link_strategies(),
            title_selectors: default_title_selectors(),
            body_tiers: default_body_tiers(),
            date_sources: default_date_sources(),
        }
    }

    /// Reject profiles whose URL or selectors would never match anything.
    pub fn validate(&self) -> Result<(), CatalogError> {
        url::Url::parse(&self.listing_url).map_err(|e| CatalogError::InvalidUrl {
            tag: self.tag,
            url: self.listing_url.clone(),
            reason: e.to_string(),
        })?;

        let mut selectors: Vec<&str> = Vec::new();
        for strategy in &self.link_strategies {
            match strategy {
                LinkStrategy::Selector { css } => selectors.push(css),
                LinkStrategy::FirstLinkIn { container } => selectors.push(container),
                LinkStrategy::HrefKeywords { keywords } => {
                    if keywords.iter().all(|k| k.trim().is_empty()) {
                        return Err(CatalogError::EmptyKeywords(self.tag));
                    }
                }
            }
        }
        selectors.extend(self.title_selectors.iter().map(String::as_str));
        selectors.extend(self.body_tiers.iter().flatten().map(String::as_str));
        selectors.extend(self.date_sources.iter().map(|d| d.css.as_str()));

        for css in selectors {
            if Selector::parse(css).is_err() {
                return Err(CatalogError::InvalidSelector {
                    tag: self.tag,
                    css: css.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading source catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing source catalog: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("[{tag}] invalid listing url {url}: {reason}")]
    InvalidUrl {
        tag: SourceTag,
        url: String,
        reason: String,
    },
    #[error("[{tag}] invalid css selector: {css}")]
    InvalidSelector { tag: SourceTag, css: String },
    #[error("[{0}] href_keywords strategy has no keywords")]
    EmptyKeywords(SourceTag),
    #[error("source catalog is empty")]
    Empty,
}

/// Ordered set of source profiles visited by one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCatalog {
    #[serde(rename = "source")]
    pub sources: Vec<SourceProfile>,
}

impl SourceCatalog {
    /// Built-in listing pages for the three supported games.
    pub fn builtin() -> Self {
        Self {
            sources: vec![
                SourceProfile::new(
                    SourceTag::Lol,
                    "https://www.leagueoflegends.com/ko-kr/news/tags/patch-notes/",
                ),
                SourceProfile::new(
                    SourceTag::Valorant,
                    "https://playvalorant.com/ko-kr/news/tags/patch-notes/",
                ),
                SourceProfile {
                    body_tiers: vec![
                        strings(&["article", ".article-content", ".post-content"]),
                        strings(&["main", ".content", "#content", ".news-detail"]),
                    ],
                    link_strategies: vec![
                        LinkStrategy::Selector {
                            css: r#"a[href*="patch-notes"]"#.to_string(),
                        },
                        LinkStrategy::HrefKeywords {
                            keywords: vec!["patch".to_string(), "update".to_string()],
                        },
                        LinkStrategy::FirstLinkIn {
                            container: "article, .news-item, .post".to_string(),
                        },
                    ],
                    ..SourceProfile::new(SourceTag::Pubg, "https://pubg.com/ko/news")
                },
            ],
        }
    }

    pub fn parse_toml(s: &str) -> Result<Self, CatalogError> {
        let catalog: SourceCatalog = toml::from_str(s)?;
        catalog.validated()
    }

    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// `path` if it exists, otherwise the built-in catalog.
    pub fn load_or_builtin(path: &Path) -> Result<Self, CatalogError> {
        if path.exists() {
            tracing::info!(path = %path.display(), "loading source catalog");
            Self::load_from(path)
        } else {
            tracing::info!(path = %path.display(), "no source catalog file; using built-in sources");
            Ok(Self::builtin())
        }
    }

    fn validated(self) -> Result<Self, CatalogError> {
        if self.sources.is_empty() {
            return Err(CatalogError::Empty);
        }
        for profile in &self.sources {
            profile.validate()?;
        }
        Ok(self)
    }
}
