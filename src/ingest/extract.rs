//! Heuristic HTML extraction for listing and detail pages.
//!
//! Everything here is synchronous and works on `&str` markup. `scraper::Html` is
//! `!Send`, so callers parse between awaits and only hold owned results.
//!
//! Every outcome is best effort: selectors come from [`SourceProfile`] data and
//! are tried in order until one yields something usable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::ingest::types::ExtractedArticle;
use crate::source::{LinkStrategy, SourceProfile};

pub const DEFAULT_MIN_BODY_CHARS: usize = 300;
pub const DEFAULT_MAX_BODY_CHARS: usize = 10_000;

/// Removed from detail pages before any body text is read.
const BOILERPLATE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "template",
    "iframe",
    "nav",
    "header",
    "footer",
    "aside",
    r#"[role="navigation"]"#,
    r#"[role="banner"]"#,
    ".ad",
    ".ads",
    ".advert",
    ".advertisement",
    ".ad-slot",
    r#"[aria-label="advertisement"]"#,
    ".social",
    ".social-share",
    ".share",
    ".share-buttons",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Body text shorter than this escalates to the next container tier.
    pub min_body_chars: usize,
    /// Hard cap on stored body length, in chars.
    pub max_body_chars: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            min_body_chars: DEFAULT_MIN_BODY_CHARS,
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
        }
    }
}

/// Collapse whitespace runs (including NBSP) to single spaces and trim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Prefix of at most `max` chars, cut on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Text nodes concatenated as-is, so inline markup (`25.<b>05</b>`) never splits a word.
fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!(%css, error = %e, "skipping invalid selector");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Listing page: link discovery
// ---------------------------------------------------------------------------

fn hrefs<'a>(anchors: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    anchors
        .filter_map(|a| a.value().attr("href").map(str::to_string))
        .collect()
}

/// Raw href candidates for one strategy, in document order.
fn strategy_candidates(document: &Html, strategy: &LinkStrategy) -> Vec<String> {
    match strategy {
        LinkStrategy::Selector { css } => match parse_selector(css) {
            Some(sel) => hrefs(document.select(&sel)),
            None => Vec::new(),
        },
        LinkStrategy::HrefKeywords { keywords } => {
            let Some(anchors) = parse_selector("a[href]") else {
                return Vec::new();
            };
            let needles: Vec<String> = keywords
                .iter()
                .map(|k| k.trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            hrefs(document.select(&anchors))
                .into_iter()
                .filter(|href| {
                    let h = href.to_ascii_lowercase();
                    needles.iter().any(|n| h.contains(n.as_str()))
                })
                .collect()
        }
        LinkStrategy::FirstLinkIn { container } => {
            let (Some(container_sel), Some(anchors)) =
                (parse_selector(container), parse_selector("a[href]"))
            else {
                return Vec::new();
            };
            match document.select(&container_sel).next() {
                Some(first) => hrefs(first.select(&anchors).take(1)),
                None => Vec::new(),
            }
        }
    }
}

/// Resolve an href against the listing URL, rejecting non-navigational links.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

fn same_page(a: &Url, b: &Url) -> bool {
    let trim = |u: &Url| {
        let mut u = u.clone();
        u.set_fragment(None);
        u.as_str().trim_end_matches('/').to_string()
    };
    trim(a) == trim(b)
}

/// Locate the latest detail-article URL on a listing page.
///
/// Strategies run in profile order; the first acceptable candidate wins.
/// `None` means nothing matched: the caller treats it as "no data", not an error.
pub fn discover_article_link(html: &str, profile: &SourceProfile) -> Option<String> {
    let base = match Url::parse(&profile.listing_url) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!(source = %profile.tag, error = %e, "listing url does not parse");
            return None;
        }
    };
    let document = Html::parse_document(html);

    for (idx, strategy) in profile.link_strategies.iter().enumerate() {
        let hit = strategy_candidates(&document, strategy)
            .into_iter()
            .filter_map(|href| resolve_href(&base, &href))
            .find(|u| !same_page(u, &base));
        if let Some(url) = hit {
            tracing::debug!(source = %profile.tag, strategy = idx, %url, "article link found");
            return Some(url.to_string());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Detail page: title, body, publish date
// ---------------------------------------------------------------------------

/// First non-empty text among `selectors`, tried in list order.
fn first_text(document: &Html, selectors: &[String]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let sel = parse_selector(css)?;
        let text = document.select(&sel).next().map(element_text)?;
        (!text.is_empty()).then_some(text)
    })
}

fn strip_boilerplate(document: &mut Html) {
    let ids: Vec<_> = BOILERPLATE_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .flat_map(|sel| document.select(&sel).map(|el| el.id()).collect::<Vec<_>>())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Tiered container selection: escalate while the text is shorter than
/// `min_chars`, then fall back to the whole `<body>`. Every tier lives inside
/// `<body>`, so the fallback is never shorter than a short tier.
fn select_body(document: &Html, tiers: &[Vec<String>], min_chars: usize) -> String {
    for (tier, selectors) in tiers.iter().enumerate() {
        if let Some(text) = first_text(document, selectors) {
            let len = text.chars().count();
            if len >= min_chars {
                return text;
            }
            tracing::debug!(tier, chars = len, min_chars, "body container too short; escalating");
        }
    }
    first_text(document, &["body".to_string()]).unwrap_or_default()
}

/// Parse the date formats seen in `datetime`/`content` attributes. Naive values are UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Attribute value of the first element matching any date source.
fn raw_published(document: &Html, profile: &SourceProfile) -> Option<String> {
    profile.date_sources.iter().find_map(|src| {
        let sel = parse_selector(&src.css)?;
        document
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr(&src.attr))
            .map(str::to_string)
    })
}

/// Extract title, cleaned body and publish date from a detail page.
///
/// Returns `None` only when both title and body come out empty.
pub fn extract_article(
    html: &str,
    url: &str,
    profile: &SourceProfile,
    limits: &ExtractLimits,
    now: DateTime<Utc>,
) -> Option<ExtractedArticle> {
    let mut document = Html::parse_document(html);

    // Title first: headings often live inside <header>, which is stripped below.
    let title = first_text(&document, &profile.title_selectors).unwrap_or_default();

    let raw_date = raw_published(&document, profile);
    let parsed = raw_date.as_deref().and_then(parse_published);
    if parsed.is_none() {
        tracing::warn!(
            source = %profile.tag,
            %url,
            raw = raw_date.as_deref().unwrap_or(""),
            "publish date missing or unparseable; using ingestion time"
        );
    }

    strip_boilerplate(&mut document);
    let body = select_body(&document, &profile.body_tiers, limits.min_body_chars);
    let body = truncate_chars(&body, limits.max_body_chars);

    if title.is_empty() && body.is_empty() {
        return None;
    }

    Some(ExtractedArticle {
        title,
        url: url.to_string(),
        body,
        published_at: parsed.unwrap_or(now),
        published_at_estimated: parsed.is_none(),
    })
}
