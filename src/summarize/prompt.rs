// src/summarize/prompt.rs
use crate::ingest::extract::truncate_chars;
use crate::source::SourceTag;

/// Below this many chars the model is told the input is thin.
const SHORT_CONTENT_CHARS: usize = 500;

/// What a reader of each game's notes cares about.
fn focus(tag: SourceTag) -> &'static str {
    match tag {
        SourceTag::Lol => {
            "1. The three most important buffs/nerfs (champions, items, runes)\n\
             2. One system change (game modes, UI, balance)"
        }
        SourceTag::Valorant => {
            "1. The three most important changes (agents, weapons, maps)\n\
             2. One system change (game modes, UI, balance)"
        }
        SourceTag::Pubg => {
            "1. The three main updates (maps, weapons, items, game modes, new features)\n\
             2. One system change (UI, bug fixes, balance, performance)"
        }
    }
}

/// Source-specific summarization instruction with the first `char_cap` body chars.
pub fn build_prompt(tag: SourceTag, body: &str, char_cap: usize, language: &str) -> String {
    let short_note = if tag == SourceTag::Pubg && body.chars().count() < SHORT_CONTENT_CHARS {
        "\nNote: the provided content is short. Summarize as much as it allows.\n"
    } else {
        ""
    };

    format!(
        "Analyze the following {game} patch notes and summarize them in this format:\n\n\
         {focus}\n\n\
         Keep the summary to at most three lines. Respond in {language}.\n\
         {short_note}\n\
         Patch notes:\n\
         {content}",
        game = tag.display_name(),
        focus = focus(tag),
        content = truncate_chars(body, char_cap),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_differ_per_source_and_cap_content() {
        let body = "Ω".repeat(20_000);
        let lol = build_prompt(SourceTag::Lol, &body, 8_000, "Korean");
        let val = build_prompt(SourceTag::Valorant, &body, 8_000, "Korean");
        assert!(lol.contains("League of Legends"));
        assert!(lol.contains("champions"));
        assert!(val.contains("agents"));
        assert_ne!(lol, val);
        assert_eq!(lol.matches('Ω').count(), 8_000);
        assert!(lol.contains("Respond in Korean"));
    }

    #[test]
    fn short_pubg_content_gets_a_note() {
        let p = build_prompt(SourceTag::Pubg, "tiny", 8_000, "English");
        assert!(p.contains("content is short"));
        let p = build_prompt(SourceTag::Lol, "tiny", 8_000, "English");
        assert!(!p.contains("content is short"));
    }
}
