// tests/sources_config.rs
//
// Source catalog loading from TOML, including the shipped config file.

use std::io::Write as _;
use std::path::Path;

use patchnote_ingest::source::{CatalogError, LinkStrategy, SourceCatalog, SourceTag};

#[test]
fn shipped_catalog_matches_builtin() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/sources.toml");
    let loaded = SourceCatalog::load_from(&path).expect("config/sources.toml parses");
    assert_eq!(loaded, SourceCatalog::builtin());
}

#[test]
fn omitted_fields_use_default_heuristics() {
    let catalog = SourceCatalog::parse_toml(
        r#"
        [[source]]
        tag = "valorant"
        listing_url = "https://news.example.test/valorant/"
        title_selectors = [".headline"]
        "#,
    )
    .unwrap();
    let profile = &catalog.sources[0];
    assert_eq!(profile.tag, SourceTag::Valorant);
    assert_eq!(profile.title_selectors, vec![".headline".to_string()]);
    assert_eq!(profile.link_strategies.len(), 3);
    assert!(matches!(
        profile.link_strategies[1],
        LinkStrategy::HrefKeywords { .. }
    ));
    assert_eq!(profile.body_tiers.len(), 2);
}

#[test]
fn bad_selector_is_rejected() {
    let err = SourceCatalog::parse_toml(
        r#"
        [[source]]
        tag = "lol"
        listing_url = "https://news.example.test/lol/"
        body_tiers = [["article"], ["h1["]]
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidSelector { .. }), "{err}");
}

#[test]
fn unknown_tag_and_bad_url_are_rejected() {
    assert!(matches!(
        SourceCatalog::parse_toml("[[source]]\ntag = \"tetris\"\nlisting_url = \"https://x.test/\"\n"),
        Err(CatalogError::Toml(_))
    ));
    assert!(matches!(
        SourceCatalog::parse_toml("[[source]]\ntag = \"lol\"\nlisting_url = \"not a url\"\n"),
        Err(CatalogError::InvalidUrl { .. })
    ));
    assert!(matches!(
        SourceCatalog::parse_toml("source = []\n"),
        Err(CatalogError::Empty)
    ));
}

#[test]
fn missing_file_falls_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = SourceCatalog::load_or_builtin(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(catalog, SourceCatalog::builtin());

    let path = dir.path().join("sources.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "[[source]]\ntag = \"pubg\"\nlisting_url = \"https://pubg.example.test/news\"").unwrap();
    let catalog = SourceCatalog::load_or_builtin(&path).unwrap();
    assert_eq!(catalog.sources.len(), 1);
    assert_eq!(catalog.sources[0].tag, SourceTag::Pubg);
}
